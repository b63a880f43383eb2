//! Per-label counters accumulated across stages and the persistence phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::label::SetLabel;
use crate::summary::{Summary, WriteTally};

/// A label write the sink did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWrite {
    pub id: ItemId,
    pub label: SetLabel,
    pub error: String,
}

/// Assignment counters for one run.
#[derive(Debug, Clone, Default)]
pub struct AssignmentStats {
    diagnostic: usize,
    practice: Vec<usize>,
    drills: BTreeMap<String, usize>,
    rejected: usize,
    written: usize,
    failed: Vec<FailedWrite>,
    persisted: bool,
}

impl AssignmentStats {
    /// Create counters for `practice_instances` practice sets, all zero.
    pub fn new(practice_instances: u32) -> Self {
        Self {
            practice: vec![0; practice_instances as usize],
            ..Self::default()
        }
    }

    /// Add `count` items assigned to `label`.
    pub fn record_assigned(&mut self, label: &SetLabel, count: usize) {
        match label {
            SetLabel::Diagnostic => self.diagnostic += count,
            SetLabel::Practice(n) => {
                let idx = (*n as usize).saturating_sub(1);
                if self.practice.len() <= idx {
                    self.practice.resize(idx + 1, 0);
                }
                self.practice[idx] += count;
            }
            SetLabel::Drill(_) => *self.drills.entry(label.to_string()).or_default() += count,
        }
    }

    /// Note how many raw items were excluded as malformed.
    pub fn record_rejected(&mut self, count: usize) {
        self.rejected += count;
    }

    /// Fold in the outcome of one persistence call.
    pub fn record_writes(&mut self, written: usize, failed: impl IntoIterator<Item = FailedWrite>) {
        self.persisted = true;
        self.written += written;
        self.failed.extend(failed);
    }

    /// Mark the run as having attempted persistence even if nothing was sent.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Items assigned across all sets.
    pub fn assigned(&self) -> usize {
        self.diagnostic + self.practice.iter().sum::<usize>() + self.drills.values().sum::<usize>()
    }

    /// Writes the sink refused.
    pub fn failed_writes(&self) -> &[FailedWrite] {
        &self.failed
    }

    /// Fixed-shape report of these counters.
    pub fn summary(&self) -> Summary {
        Summary {
            diagnostic: self.diagnostic,
            practice: self
                .practice
                .iter()
                .enumerate()
                .map(|(idx, count)| (SetLabel::Practice(idx as u32 + 1), *count))
                .collect(),
            drills: self
                .drills
                .iter()
                .map(|(label, count)| (label.clone(), *count))
                .collect(),
            total: self.assigned(),
            rejected: self.rejected,
            writes: if self.persisted {
                WriteTally::Completed {
                    written: self.written,
                    failed: self.failed.len(),
                }
            } else {
                WriteTally::Skipped
            },
        }
    }
}
