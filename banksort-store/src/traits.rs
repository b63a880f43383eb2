//! Collaborator traits: where the pool comes from and where labels go.

use async_trait::async_trait;
use banksort_core::{ItemId, RawItem, SetLabel};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SinkError};

/// Label and section of one stored item, used for the label census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRow {
    pub set_label: Option<String>,
    pub section: Option<String>,
}

/// Supplies the candidate pool.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Every item of `test_type` still carrying the raw label.
    ///
    /// Failure here is fatal for the run: return
    /// [`Error::SourceUnavailable`](crate::Error::SourceUnavailable).
    async fn fetch_unassigned(&self, test_type: &str) -> Result<Vec<RawItem>>;

    /// Label and section of every item of `test_type`, assigned or not.
    async fn fetch_census(&self, test_type: &str) -> Result<Vec<CensusRow>>;
}

/// Durably records set assignments, one item at a time.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Overwrite the set label of a single item.
    ///
    /// Writing the label an item already carries must leave it unchanged.
    async fn write_label(&self, id: &ItemId, label: &SetLabel) -> std::result::Result<(), SinkError>;
}
