//! Re-applies a saved plan to items whose label writes were lost.

use std::collections::BTreeMap;
use std::fmt;

use banksort_core::{AllocationPlan, FailedWrite, ItemId, SetLabel};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::persister::{PersistConfig, Persister};
use crate::traits::{ItemSink, QuestionSource};

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Raw items whose planned label was written this pass.
    pub repaired: usize,
    /// Raw items whose planned label still could not be written.
    pub failed: Vec<FailedWrite>,
    /// Raw items the plan does not mention.
    pub unplanned: Vec<ItemId>,
    /// Planned items already carrying a label.
    pub already_labeled: usize,
}

impl ReconcileReport {
    /// Whether every planned item now carries its label.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- RECONCILE SUMMARY ---")?;
        writeln!(f, "Already labeled: {}", self.already_labeled)?;
        writeln!(f, "Repaired: {}", self.repaired)?;
        writeln!(f, "Still failing: {}", self.failed.len())?;
        write!(f, "Raw items not in plan: {}", self.unplanned.len())
    }
}

/// Write the planned label of every planned item that is still raw.
///
/// Items the plan assigned but that already carry a label are left alone,
/// so the pass can be repeated safely.
pub async fn reconcile<Src, Snk>(
    source: &Src,
    sink: &Snk,
    persist: &PersistConfig,
    plan: &AllocationPlan,
) -> Result<ReconcileReport>
where
    Src: QuestionSource + ?Sized,
    Snk: ItemSink + ?Sized,
{
    let persister = Persister::new(sink, persist.clone())?;
    let raw = source
        .fetch_unassigned(&plan.test_type)
        .await
        .map_err(|e| match e {
            Error::SourceUnavailable(_) => e,
            other => Error::SourceUnavailable(other.to_string()),
        })?;

    let planned = plan.by_item();
    let mut pending: BTreeMap<&SetLabel, Vec<&ItemId>> = BTreeMap::new();
    let mut report = ReconcileReport::default();

    for item in &raw {
        match planned.get(&item.id) {
            Some(label) => pending.entry(*label).or_default().push(&item.id),
            None => report.unplanned.push(item.id.clone()),
        }
    }
    let pending_count: usize = pending.values().map(Vec::len).sum();
    report.already_labeled = plan.len().saturating_sub(pending_count);
    info!(
        run_id = %plan.run_id,
        pending = pending_count,
        unplanned = report.unplanned.len(),
        "reconciling plan"
    );

    for (label, ids) in pending {
        let outcome = persister.persist_ids(label, &ids).await;
        report.repaired += outcome.written;
        report.failed.extend(outcome.failed);
    }

    if !report.unplanned.is_empty() {
        warn!(
            count = report.unplanned.len(),
            "raw items not covered by the plan were left untouched"
        );
    }
    Ok(report)
}
