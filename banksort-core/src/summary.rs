//! End-of-run report shown to the operator.

use std::fmt;

use crate::label::SetLabel;

/// Outcome of the persistence phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTally {
    /// Nothing was sent to the sink (dry run).
    Skipped,
    /// Labels were written; `failed` writes were refused.
    Completed { written: usize, failed: usize },
}

/// Fixed-shape summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub diagnostic: usize,
    /// One entry per configured practice instance, zero counts included.
    pub practice: Vec<(SetLabel, usize)>,
    /// Drill buckets sorted by label.
    pub drills: Vec<(String, usize)>,
    pub total: usize,
    pub rejected: usize,
    pub writes: WriteTally,
}

impl Summary {
    /// Number of label writes that failed.
    pub fn failed_writes(&self) -> usize {
        match self.writes {
            WriteTally::Completed { failed, .. } => failed,
            WriteTally::Skipped => 0,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- ASSIGNMENT SUMMARY ---")?;
        writeln!(f, "Diagnostic test: {} questions", self.diagnostic)?;

        writeln!(f, "\nPractice tests:")?;
        for (label, count) in &self.practice {
            let n = match label {
                SetLabel::Practice(n) => *n,
                _ => continue,
            };
            writeln!(f, "  Practice test {n}: {count} questions")?;
        }

        writeln!(f, "\nDrill sets:")?;
        if self.drills.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (label, count) in &self.drills {
            writeln!(f, "  {label}: {count} questions")?;
        }

        writeln!(f, "\nTotal questions assigned: {}", self.total)?;
        if self.rejected > 0 {
            writeln!(f, "Skipped (malformed): {}", self.rejected)?;
        }
        match self.writes {
            WriteTally::Skipped => writeln!(f, "Label writes: skipped (dry run)")?,
            WriteTally::Completed { written, failed } => {
                writeln!(f, "Label writes: {written} succeeded, {failed} failed")?;
                if failed > 0 {
                    writeln!(f, "{failed} items could not be written; run `banksort reconcile` with the plan file")?;
                }
            }
        }
        Ok(())
    }
}
