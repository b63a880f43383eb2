//! Error types for the allocation engine.

use thiserror::Error;

use crate::item::ItemId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while allocating or recording a plan.
#[derive(Debug, Error)]
pub enum Error {
    /// An allocator stage tried to claim an item that was already assigned.
    ///
    /// This never happens when the stages filter on the tracker correctly, so
    /// it aborts the run instead of being recovered.
    #[error("item {0} was assigned twice")]
    DuplicateAssignment(ItemId),

    /// A stage was invoked before the stages it depends on completed.
    #[error("stage {requested} cannot run yet, expected {expected}")]
    StageOrder {
        requested: &'static str,
        expected: &'static str,
    },

    /// Static configuration rejected before allocation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A set label string could not be parsed.
    #[error("invalid set label: {0}")]
    InvalidLabel(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
