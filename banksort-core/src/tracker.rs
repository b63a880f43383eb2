//! Assignment tracker: the exclusivity guard every allocator stage consults.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::item::ItemId;

/// Identifiers already allocated in the current run.
#[derive(Debug, Default)]
pub struct AssignmentTracker {
    assigned: HashSet<ItemId>,
}

impl AssignmentTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an item as allocated. Claiming an item twice is a defect in the
    /// calling stage and fails with [`Error::DuplicateAssignment`].
    pub fn claim(&mut self, id: &ItemId) -> Result<()> {
        if !self.assigned.insert(id.clone()) {
            return Err(Error::DuplicateAssignment(id.clone()));
        }
        Ok(())
    }

    /// Whether the item was already claimed.
    pub fn is_assigned(&self, id: &ItemId) -> bool {
        self.assigned.contains(id)
    }

    /// Number of claimed items.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
