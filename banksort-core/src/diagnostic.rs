//! Diagnostic selector: at most one item per (section, sub-skill, difficulty)
//! cell.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::Result;
use crate::item::{Difficulty, Item};
use crate::pool::IndexedPool;
use crate::tracker::AssignmentTracker;

/// Pick one unassigned item uniformly at random from every populated cell.
///
/// Cells that are absent, or whose items are all claimed already, are skipped;
/// a sub-skill does not need every difficulty level.
pub fn select_diagnostic<R>(
    pool: &IndexedPool,
    tracker: &mut AssignmentTracker,
    rng: &mut R,
) -> Result<Vec<Item>>
where
    R: Rng + ?Sized,
{
    let mut selected = Vec::new();

    for (section, sub_skill, cells) in pool.skills() {
        for difficulty in Difficulty::all() {
            let Some(cell) = cells.get(&difficulty) else {
                continue;
            };
            let remaining: Vec<&Item> = cell
                .iter()
                .filter(|item| !tracker.is_assigned(&item.id))
                .collect();
            let Some(&item) = remaining.choose(rng) else {
                debug!(section, sub_skill, %difficulty, "cell exhausted before diagnostic pick");
                continue;
            };
            tracker.claim(&item.id)?;
            selected.push(item.clone());
        }
    }

    info!(count = selected.len(), "selected diagnostic items");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::item::RawItem;

    #[test]
    fn picks_one_item_per_populated_cell() {
        let pool = IndexedPool::build(vec![
            RawItem::new("a1", "Mathematics", "Algebra", 1),
            RawItem::new("a2", "Mathematics", "Algebra", 1),
            RawItem::new("a3", "Mathematics", "Algebra", 4),
            RawItem::new("g1", "Mathematics", "Geometry", 2),
            RawItem::new("v1", "Verbal Reasoning", "Analogies", 5),
            RawItem::new("v2", "Verbal Reasoning", "Analogies", 5),
        ]);
        let mut tracker = AssignmentTracker::new();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = select_diagnostic(&pool, &mut tracker, &mut rng).unwrap();

        assert_eq!(picked.len(), 4);
        let cells: HashSet<_> = picked.iter().map(Item::cell).collect();
        assert_eq!(cells.len(), 4, "at most one item per cell");
        assert_eq!(tracker.len(), 4);
        assert!(picked.iter().all(|item| tracker.is_assigned(&item.id)));
    }

    #[test]
    fn single_item_pool_selects_it() {
        let pool = IndexedPool::build(vec![RawItem::new("only", "Math", "Algebra", 3)]);
        let mut tracker = AssignmentTracker::new();
        let picked = select_diagnostic(&pool, &mut tracker, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id.as_str(), "only");
    }

    #[test]
    fn skips_cells_already_claimed() {
        let pool = IndexedPool::build(vec![
            RawItem::new("a", "Math", "Algebra", 1),
            RawItem::new("b", "Math", "Algebra", 2),
        ]);
        let mut tracker = AssignmentTracker::new();
        tracker.claim(&"a".into()).unwrap();

        let picked = select_diagnostic(&pool, &mut tracker, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id.as_str(), "b");
    }

    #[test]
    fn same_seed_picks_same_items() {
        let raw: Vec<RawItem> = (0..30)
            .map(|n| RawItem::new(format!("q{n}"), "Math", "Algebra", (n % 5) + 1))
            .collect();
        let pool = IndexedPool::build(raw);

        let run = |seed| {
            let mut tracker = AssignmentTracker::new();
            select_diagnostic(&pool, &mut tracker, &mut StdRng::seed_from_u64(seed)).unwrap()
        };

        assert_eq!(run(11), run(11));
        assert_eq!(run(11).len(), 5);
    }
}
