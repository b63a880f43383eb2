//! Drill fallback allocator: everything still unassigned goes to a bucket
//! keyed by its sub-skill.

use indexmap::IndexMap;
use tracing::info;

use crate::error::Result;
use crate::item::Item;
use crate::label::SetLabel;
use crate::pool::IndexedPool;
use crate::tracker::AssignmentTracker;

/// Leftover items of one sub-skill.
#[derive(Debug, Clone)]
pub struct DrillBucket {
    /// `drill-<slug>` label derived from the sub-skill.
    pub label: SetLabel,
    /// Sub-skill name as first seen in the pool.
    pub sub_skill: String,
    pub items: Vec<Item>,
}

/// Sweep the pool and bucket every unclaimed item by sub-skill.
///
/// Sub-skills whose names derive the same label (same words, different case)
/// share a bucket. Buckets are returned in first-seen order.
pub fn sweep_drills(pool: &IndexedPool, tracker: &mut AssignmentTracker) -> Result<Vec<DrillBucket>> {
    let mut buckets: IndexMap<SetLabel, DrillBucket> = IndexMap::new();

    for item in pool.items() {
        if tracker.is_assigned(&item.id) {
            continue;
        }
        tracker.claim(&item.id)?;
        let label = SetLabel::drill_for(&item.sub_skill);
        buckets
            .entry(label.clone())
            .or_insert_with(|| DrillBucket {
                label,
                sub_skill: item.sub_skill.clone(),
                items: Vec::new(),
            })
            .items
            .push(item.clone());
    }

    info!(
        buckets = buckets.len(),
        items = buckets.values().map(|b| b.items.len()).sum::<usize>(),
        "created drill sets"
    );
    Ok(buckets.into_values().collect())
}
