//! Practice distributor: fills fixed-composition practice instances.
//!
//! Instances are filled one after another, and within an instance sections
//! are drawn in their declared order, all against the same shrinking pool.
//! Later sections and later instances receive fewer items than their target
//! once supply runs out.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SectionQuota;
use crate::error::Result;
use crate::item::Item;
use crate::label::SetLabel;
use crate::pool::IndexedPool;
use crate::tracker::AssignmentTracker;

/// A section whose quota was not met in a practice instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub section: String,
    pub target: usize,
    pub drawn: usize,
}

/// Items drawn for one practice instance.
#[derive(Debug, Clone)]
pub struct PracticeSet {
    /// `practice_<n>` label of the instance.
    pub label: SetLabel,
    pub items: Vec<Item>,
    /// Sections that received fewer items than their target.
    pub shortfalls: Vec<Shortfall>,
}

impl PracticeSet {
    /// Number of items drawn for `section`.
    pub fn count_for(&self, section: &str) -> usize {
        self.items
            .iter()
            .filter(|item| item.section == section)
            .count()
    }
}

/// Fill practice instance `instance` (numbered from 1).
///
/// For each section the still-unassigned items are collected across every
/// sub-skill and difficulty, and `min(target, available)` of them are drawn
/// uniformly without replacement.
pub fn fill_instance<R>(
    pool: &IndexedPool,
    tracker: &mut AssignmentTracker,
    instance: u32,
    sections: &[SectionQuota],
    rng: &mut R,
) -> Result<PracticeSet>
where
    R: Rng + ?Sized,
{
    let label = SetLabel::Practice(instance);
    let mut items = Vec::new();
    let mut shortfalls = Vec::new();

    for quota in sections {
        if quota.target == 0 {
            continue;
        }
        let available: Vec<&Item> = pool
            .section_items(&quota.name)
            .filter(|item| !tracker.is_assigned(&item.id))
            .collect();
        let take = quota.target.min(available.len());

        if take == 0 {
            warn!(section = %quota.name, set = %label, "no questions available for section");
        } else if take < quota.target {
            warn!(
                section = %quota.name,
                set = %label,
                target = quota.target,
                drawn = take,
                "section quota only partially filled"
            );
        }
        if take < quota.target {
            shortfalls.push(Shortfall {
                section: quota.name.clone(),
                target: quota.target,
                drawn: take,
            });
        }

        for &item in available.choose_multiple(rng, take) {
            tracker.claim(&item.id)?;
            items.push(item.clone());
        }
    }

    info!(set = %label, count = items.len(), "filled practice set");
    Ok(PracticeSet {
        label,
        items,
        shortfalls,
    })
}

/// Fill instances `1..=instances` in order.
pub fn distribute_practice<R>(
    pool: &IndexedPool,
    tracker: &mut AssignmentTracker,
    instances: u32,
    sections: &[SectionQuota],
    rng: &mut R,
) -> Result<Vec<PracticeSet>>
where
    R: Rng + ?Sized,
{
    (1..=instances)
        .map(|instance| fill_instance(pool, tracker, instance, sections, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::item::RawItem;

    fn verbal_pool(count: usize) -> IndexedPool {
        IndexedPool::build((0..count).map(|n| {
            RawItem::new(format!("v{n}"), "Verbal", "Analogies", (n % 5) as i64 + 1)
        }))
    }

    #[test]
    fn later_instances_starve_once_pool_is_drained() {
        let pool = verbal_pool(40);
        let mut tracker = AssignmentTracker::new();
        let quotas = [SectionQuota::new("Verbal", 38)];

        let sets =
            distribute_practice(&pool, &mut tracker, 5, &quotas, &mut StdRng::seed_from_u64(5))
                .unwrap();

        let counts: Vec<usize> = sets.iter().map(|set| set.items.len()).collect();
        assert_eq!(counts, vec![38, 2, 0, 0, 0]);
        assert!(sets[0].shortfalls.is_empty());
        assert_eq!(
            sets[1].shortfalls,
            vec![Shortfall {
                section: "Verbal".into(),
                target: 38,
                drawn: 2
            }]
        );
        assert_eq!(sets[4].shortfalls[0].drawn, 0);
        assert_eq!(tracker.len(), 40);
    }

    #[test]
    fn earlier_section_drains_shared_supply_first() {
        // Both quotas name the same section; the first one declared wins.
        let pool = verbal_pool(10);
        let mut tracker = AssignmentTracker::new();
        let quotas = [SectionQuota::new("Verbal", 8), SectionQuota::new("Verbal", 8)];

        let set = fill_instance(&pool, &mut tracker, 1, &quotas, &mut StdRng::seed_from_u64(9))
            .unwrap();

        assert_eq!(set.items.len(), 10);
        assert_eq!(set.shortfalls.len(), 1);
        assert_eq!(set.shortfalls[0].drawn, 2);
    }

    #[test]
    fn draws_exact_target_when_supply_allows() {
        let mut raw: Vec<RawItem> = (0..20)
            .map(|n| RawItem::new(format!("m{n}"), "Mathematics", "Algebra", 1))
            .collect();
        raw.extend((0..20).map(|n| RawItem::new(format!("r{n}"), "Reading", "Inference", 2)));
        let pool = IndexedPool::build(raw);
        let mut tracker = AssignmentTracker::new();
        let quotas = [
            SectionQuota::new("Mathematics", 6),
            SectionQuota::new("Reading", 4),
        ];

        let set = fill_instance(&pool, &mut tracker, 2, &quotas, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(set.label, SetLabel::Practice(2));
        assert_eq!(set.count_for("Mathematics"), 6);
        assert_eq!(set.count_for("Reading"), 4);
        assert!(set.shortfalls.is_empty());
    }

    #[test]
    fn missing_section_is_omitted_with_shortfall() {
        let pool = verbal_pool(3);
        let mut tracker = AssignmentTracker::new();
        let quotas = [SectionQuota::new("Mathematics", 5)];

        let set = fill_instance(&pool, &mut tracker, 1, &quotas, &mut StdRng::seed_from_u64(2))
            .unwrap();

        assert!(set.items.is_empty());
        assert_eq!(set.shortfalls[0].drawn, 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn claimed_items_are_never_redrawn() {
        let pool = verbal_pool(6);
        let mut tracker = AssignmentTracker::new();
        for n in 0..4 {
            tracker.claim(&format!("v{n}").into()).unwrap();
        }
        let quotas = [SectionQuota::new("Verbal", 10)];

        let set = fill_instance(&pool, &mut tracker, 1, &quotas, &mut StdRng::seed_from_u64(4))
            .unwrap();

        let mut ids: Vec<&str> = set.items.iter().map(|item| item.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["v4", "v5"]);
    }
}
