//! Static allocation settings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of practice instances.
pub const DEFAULT_PRACTICE_INSTANCES: u32 = 5;

/// Target item count for one section within every practice instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuota {
    /// Section name as tagged on the items.
    pub name: String,
    /// Items to draw for this section per instance.
    pub target: usize,
}

impl SectionQuota {
    pub fn new(name: impl Into<String>, target: usize) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// Set sizes supplied to the allocator.
///
/// `sections` is ordered: earlier sections drain the shared pool first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub practice_instances: u32,
    pub sections: Vec<SectionQuota>,
}

impl Default for AllocationConfig {
    /// The EduTest practice-test structure.
    fn default() -> Self {
        Self {
            practice_instances: DEFAULT_PRACTICE_INSTANCES,
            sections: vec![
                SectionQuota::new("Verbal Reasoning", 38),
                SectionQuota::new("Reading Comprehension", 28),
                SectionQuota::new("Written Expression", 1),
                SectionQuota::new("Mathematics", 33),
                SectionQuota::new("Non-verbal Reasoning", 33),
            ],
        }
    }
}

impl AllocationConfig {
    /// Reject settings the allocator cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.practice_instances == 0 {
            return Err(Error::InvalidConfig(
                "practice_instances must be at least 1".into(),
            ));
        }
        for (idx, quota) in self.sections.iter().enumerate() {
            if quota.name.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "section #{} has an empty name",
                    idx + 1
                )));
            }
            if self.sections[..idx].iter().any(|q| q.name == quota.name) {
                return Err(Error::InvalidConfig(format!(
                    "section '{}' is listed twice",
                    quota.name
                )));
            }
        }
        Ok(())
    }
}
