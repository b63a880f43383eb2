//! In-memory question store for testing and dry runs.
//!
//! Holds rows without persistence and implements both collaborator traits.
//! Individual writes can be made to fail to exercise partial-failure paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use banksort_core::{ItemId, RAW_LABEL, RawItem, SetLabel};
use tokio::sync::RwLock;

use crate::error::{Error, Result, SinkError};
use crate::traits::{CensusRow, ItemSink, QuestionSource};

/// A stored row tagged with its test type.
#[derive(Debug, Clone)]
struct StoredRow {
    test_type: String,
    item: RawItem,
}

/// In-memory implementation of [`QuestionSource`] and [`ItemSink`].
pub struct InMemoryStore {
    rows: RwLock<Vec<StoredRow>>,
    failing: RwLock<HashSet<ItemId>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            failing: RwLock::new(HashSet::new()),
            unavailable: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Create a store holding `items` under `test_type`.
    #[must_use]
    pub fn with_items(test_type: &str, items: impl IntoIterator<Item = RawItem>) -> Self {
        let rows = items
            .into_iter()
            .map(|item| StoredRow {
                test_type: test_type.to_string(),
                item,
            })
            .collect();
        Self {
            rows: RwLock::new(rows),
            ..Self::new()
        }
    }

    /// Add a row.
    pub async fn insert(&self, test_type: &str, item: RawItem) {
        self.rows.write().await.push(StoredRow {
            test_type: test_type.to_string(),
            item,
        });
    }

    /// Make every write for `id` fail with a 500 until cleared.
    pub async fn fail_writes_for(&self, id: impl Into<ItemId>) {
        self.failing.write().await.insert(id.into());
    }

    /// Let previously failing writes succeed again.
    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Make reads fail as if the store could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current label of an item.
    pub async fn label_of(&self, id: &ItemId) -> Option<String> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| &row.item.id == id)
            .and_then(|row| row.item.set_label.clone())
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionSource for InMemoryStore {
    async fn fetch_unassigned(&self, test_type: &str) -> Result<Vec<RawItem>> {
        self.check_available()?;
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.test_type == test_type)
            .filter(|row| row.item.set_label.as_deref() == Some(RAW_LABEL))
            .map(|row| row.item.clone())
            .collect())
    }

    async fn fetch_census(&self, test_type: &str) -> Result<Vec<CensusRow>> {
        self.check_available()?;
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.test_type == test_type)
            .map(|row| CensusRow {
                set_label: row.item.set_label.clone(),
                section: row.item.section.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ItemSink for InMemoryStore {
    async fn write_label(&self, id: &ItemId, label: &SetLabel) -> std::result::Result<(), SinkError> {
        if self.failing.read().await.contains(id) {
            return Err(SinkError::Status {
                status: 500,
                body: "injected failure".into(),
            });
        }
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| &row.item.id == id) else {
            return Err(SinkError::Status {
                status: 404,
                body: format!("no item with id {id}"),
            });
        };
        row.item.set_label = Some(label.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
