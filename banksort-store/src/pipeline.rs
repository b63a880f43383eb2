//! One allocation run: fetch, allocate stage by stage, persist, report.

use banksort_core::{
    AllocationConfig, AllocationPlan, Allocator, AssignmentStats, IndexedPool, Item, SetLabel,
    Summary,
};
use rand::Rng;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::persister::{PersistConfig, Persister};
use crate::traits::{ItemSink, QuestionSource};

/// Parameters of a single run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub test_type: String,
    /// Recorded in the plan so the run can be reproduced.
    pub seed: Option<u64>,
    /// Allocate and report without writing anything.
    pub dry_run: bool,
}

impl RunRequest {
    pub fn new(test_type: impl Into<String>) -> Self {
        Self {
            test_type: test_type.into(),
            seed: None,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: Summary,
    /// Every assignment made, whether or not it was written.
    pub plan: AllocationPlan,
}

/// Run a full allocation against `source`, writing labels to `sink`.
///
/// Returns an error only for fatal conditions: the pool cannot be fetched,
/// the configuration is invalid, or the engine detects a defect. Individual
/// write failures are reported in the summary.
pub async fn run<Src, Snk, R>(
    source: &Src,
    sink: &Snk,
    allocation: &AllocationConfig,
    persist: &PersistConfig,
    request: &RunRequest,
    rng: R,
) -> Result<RunReport>
where
    Src: QuestionSource + ?Sized,
    Snk: ItemSink + ?Sized,
    R: Rng,
{
    allocation.validate()?;
    let persister = Persister::new(sink, persist.clone())?;

    let raw = source
        .fetch_unassigned(&request.test_type)
        .await
        .map_err(|e| match e {
            Error::SourceUnavailable(_) => e,
            other => Error::SourceUnavailable(other.to_string()),
        })?;
    info!(test_type = %request.test_type, fetched = raw.len(), "fetched unassigned items");

    let mut stats = AssignmentStats::new(allocation.practice_instances);
    let mut plan = AllocationPlan::new(&request.test_type, request.seed);
    if !request.dry_run {
        stats.mark_persisted();
    }

    if raw.is_empty() {
        info!("no unassigned items; nothing to allocate");
        return Ok(RunReport {
            summary: stats.summary(),
            plan,
        });
    }

    let pool = IndexedPool::build(raw);
    stats.record_rejected(pool.rejected().len());

    let mut stage = Stage {
        persister: &persister,
        stats: &mut stats,
        plan: &mut plan,
        dry_run: request.dry_run,
    };
    let mut allocator = Allocator::new(&pool, allocation, rng)?;

    let diagnostic = allocator.diagnostic()?;
    stage.commit(&SetLabel::Diagnostic, &diagnostic).await;

    while let Some(set) = allocator.next_practice()? {
        stage.commit(&set.label, &set.items).await;
    }

    for bucket in allocator.drills()? {
        stage.commit(&bucket.label, &bucket.items).await;
    }

    if request.dry_run {
        info!(assigned = stats.assigned(), "dry run complete; no labels written");
    } else if !stats.failed_writes().is_empty() {
        warn!(
            failed = stats.failed_writes().len(),
            "some labels were not written; reconcile with the plan file"
        );
    }

    Ok(RunReport {
        summary: stats.summary(),
        plan,
    })
}

/// Bookkeeping shared by every stage of a run.
struct Stage<'r, 'a, S: ItemSink + ?Sized> {
    persister: &'r Persister<'a, S>,
    stats: &'r mut AssignmentStats,
    plan: &'r mut AllocationPlan,
    dry_run: bool,
}

impl<S: ItemSink + ?Sized> Stage<'_, '_, S> {
    async fn commit(&mut self, label: &SetLabel, items: &[Item]) {
        info!(label = %label, count = items.len(), "set allocated");
        self.stats.record_assigned(label, items.len());
        self.plan.record(label, items);
        if self.dry_run || items.is_empty() {
            return;
        }
        let outcome = self.persister.persist(label, items).await;
        self.stats.record_writes(outcome.written, outcome.failed);
    }
}
