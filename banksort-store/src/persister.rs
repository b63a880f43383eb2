//! Writes set labels to the sink, one item at a time.
//!
//! Items are split into batches for pacing and progress logging. Inside a
//! batch up to `concurrency` writes are in flight; their outcomes are folded
//! into a single [`PersistOutcome`] once the batch drains. A failed write is
//! logged and counted but never stops its siblings or later batches.

use std::time::Duration;

use banksort_core::{FailedWrite, Item, ItemId, SetLabel};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, SinkError};
use crate::traits::ItemSink;

/// Default number of items per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default number of writes in flight within a batch.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Default number of retries after a failed write.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Pacing and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub max_retries: u32,
    /// Retry `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl PersistConfig {
    /// Reject settings that would stall the persister.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

/// What happened to one `persist` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub written: usize,
    pub failed: Vec<FailedWrite>,
}

impl PersistOutcome {
    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: PersistOutcome) {
        self.written += other.written;
        self.failed.extend(other.failed);
    }

    /// Whether every write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Label writer over an [`ItemSink`].
pub struct Persister<'a, S: ItemSink + ?Sized> {
    sink: &'a S,
    config: PersistConfig,
}

impl<'a, S: ItemSink + ?Sized> Persister<'a, S> {
    /// Create a persister, validating `config`.
    pub fn new(sink: &'a S, config: PersistConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { sink, config })
    }

    /// Write `label` for every item in `items`.
    pub async fn persist(&self, label: &SetLabel, items: &[Item]) -> PersistOutcome {
        let ids: Vec<&ItemId> = items.iter().map(|item| &item.id).collect();
        self.persist_ids(label, &ids).await
    }

    /// Write `label` for every id in `ids`.
    pub async fn persist_ids(&self, label: &SetLabel, ids: &[&ItemId]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();
        let batches = ids.len().div_ceil(self.config.batch_size);

        for (index, batch) in ids.chunks(self.config.batch_size).enumerate() {
            let results: Vec<(&ItemId, std::result::Result<(), SinkError>)> =
                stream::iter(batch.iter().copied())
                    .map(|id| async move { (id, self.write_with_retry(id, label).await) })
                    .buffer_unordered(self.config.concurrency)
                    .collect()
                    .await;

            let before = outcome.failed.len();
            for (id, result) in results {
                match result {
                    Ok(()) => outcome.written += 1,
                    Err(e) => {
                        warn!(item = %id, label = %label, error = %e, "label write failed");
                        outcome.failed.push(FailedWrite {
                            id: id.clone(),
                            label: label.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            debug!(
                label = %label,
                batch = index + 1,
                of = batches,
                size = batch.len(),
                failed = outcome.failed.len() - before,
                "batch persisted"
            );
        }

        info!(
            label = %label,
            written = outcome.written,
            failed = outcome.failed.len(),
            "set persisted"
        );
        outcome
    }

    async fn write_with_retry(&self, id: &ItemId, label: &SetLabel) -> std::result::Result<(), SinkError> {
        let mut attempt = 0;
        loop {
            match self.sink.write_label(id, label).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(item = %id, attempt, error = %e, "retrying label write");
                    let delay = self.config.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use banksort_core::{Difficulty, RawItem};

    use super::*;
    use crate::memory::InMemoryStore;

    fn items(n: usize) -> Vec<Item> {
        (1..=n)
            .map(|i| Item {
                id: ItemId::new(i.to_string()),
                section: "Mathematics".into(),
                sub_skill: "Algebra".into(),
                difficulty: Difficulty::new(1).unwrap(),
            })
            .collect()
    }

    fn store(n: usize) -> InMemoryStore {
        InMemoryStore::with_items(
            "EduTest",
            (1..=n).map(|i| RawItem::new(i.to_string(), "Mathematics", "Algebra", 1)),
        )
    }

    fn no_retry() -> PersistConfig {
        PersistConfig {
            max_retries: 0,
            ..PersistConfig::default()
        }
    }

    #[test]
    fn zero_batch_size_or_concurrency_is_rejected() {
        let bad_batch = PersistConfig {
            batch_size: 0,
            ..PersistConfig::default()
        };
        let bad_concurrency = PersistConfig {
            concurrency: 0,
            ..PersistConfig::default()
        };
        assert!(bad_batch.validate().is_err());
        assert!(bad_concurrency.validate().is_err());
        assert!(PersistConfig::default().validate().is_ok());
    }

    #[tokio::test]
    async fn one_failing_item_does_not_stop_the_batch() {
        let store = store(50);
        store.fail_writes_for("27").await;
        let persister = Persister::new(&store, no_retry()).unwrap();

        let outcome = persister.persist(&SetLabel::Practice(1), &items(50)).await;

        assert_eq!(outcome.written, 49);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id.as_str(), "27");
        assert_eq!(store.label_of(&"26".into()).await.as_deref(), Some("practice_1"));
        assert_eq!(store.label_of(&"27".into()).await.as_deref(), Some("raw"));
        assert_eq!(store.label_of(&"28".into()).await.as_deref(), Some("practice_1"));
    }

    #[tokio::test]
    async fn later_batches_run_after_a_failure() {
        let store = store(12);
        store.fail_writes_for("2").await;
        let config = PersistConfig {
            batch_size: 5,
            ..no_retry()
        };
        let persister = Persister::new(&store, config).unwrap();

        let outcome = persister.persist(&SetLabel::Diagnostic, &items(12)).await;

        assert_eq!(outcome.written, 11);
        assert_eq!(store.label_of(&"12".into()).await.as_deref(), Some("diagnostic"));
    }

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ItemSink for Flaky {
        async fn write_label(&self, _: &ItemId, _: &SetLabel) -> std::result::Result<(), SinkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SinkError::Transport("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let sink = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let persister = Persister::new(&sink, PersistConfig::default()).unwrap();

        let outcome = persister.persist(&SetLabel::Diagnostic, &items(1)).await;

        assert!(outcome.is_clean());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_final_failure_counts() {
        let sink = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let persister = Persister::new(&sink, PersistConfig::default()).unwrap();

        let outcome = persister.persist(&SetLabel::Diagnostic, &items(1)).await;

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].error, "request failed: connection reset");
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rewriting_the_same_label_is_harmless() {
        let store = store(3);
        let persister = Persister::new(&store, no_retry()).unwrap();

        persister.persist(&SetLabel::Practice(2), &items(3)).await;
        let again = persister.persist(&SetLabel::Practice(2), &items(3)).await;

        assert_eq!(again.written, 3);
        assert_eq!(store.label_of(&"1".into()).await.as_deref(), Some("practice_2"));
    }
}
