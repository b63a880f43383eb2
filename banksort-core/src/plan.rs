//! Allocation plan: a durable record of which label every item was meant to
//! receive, used to repair writes that failed during a run.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::item::{Item, ItemId};
use crate::label::SetLabel;

/// Unique identifier for an allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new run ID with a UUIDv7 (time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One intended (item, label) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssignment {
    pub id: ItemId,
    pub label: SetLabel,
}

/// Every assignment decided by one run, in stage order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub run_id: RunId,
    pub test_type: String,
    /// Seed of the random source, when the run was seeded.
    pub seed: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub assignments: Vec<PlannedAssignment>,
}

impl AllocationPlan {
    /// Start an empty plan for `test_type`.
    pub fn new(test_type: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            run_id: RunId::new(),
            test_type: test_type.into(),
            seed,
            created_at: Utc::now(),
            assignments: Vec::new(),
        }
    }

    /// Append the items of one set.
    pub fn record(&mut self, label: &SetLabel, items: &[Item]) {
        self.assignments
            .extend(items.iter().map(|item| PlannedAssignment {
                id: item.id.clone(),
                label: label.clone(),
            }));
    }

    /// Lookup table from item to planned label.
    pub fn by_item(&self) -> HashMap<&ItemId, &SetLabel> {
        self.assignments
            .iter()
            .map(|planned| (&planned.id, &planned.label))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Write the plan as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a plan written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
