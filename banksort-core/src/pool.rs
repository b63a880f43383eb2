//! Pool indexer: groups a flat item pool into section → sub-skill →
//! difficulty → items.
//!
//! Sections and sub-skills keep the order in which the source first produced
//! them, and items within a cell keep source order. Malformed rows are logged
//! and set aside instead of failing the run.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::item::{Difficulty, Item, RawItem, RejectReason, Rejection};

/// Items of one (section, sub-skill) pair, keyed by difficulty.
pub type CellMap = BTreeMap<Difficulty, Vec<Item>>;

type SkillMap = IndexMap<String, CellMap>;

/// The indexed question pool for one run. Read-only once built.
#[derive(Debug, Default)]
pub struct IndexedPool {
    sections: IndexMap<String, SkillMap>,
    len: usize,
    rejected: Vec<Rejection>,
}

impl IndexedPool {
    /// Index a raw pool, validating each row.
    pub fn build<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = RawItem>,
    {
        let mut pool = Self::default();
        let mut seen = HashSet::new();

        for row in raw {
            let item = match row.validate() {
                Ok(item) => item,
                Err(rejection) => {
                    warn!(id = %rejection.id, reason = %rejection.reason, "skipping malformed item");
                    pool.rejected.push(rejection);
                    continue;
                }
            };
            if !seen.insert(item.id.clone()) {
                warn!(id = %item.id, "skipping repeated item identifier");
                pool.rejected.push(Rejection {
                    id: item.id,
                    reason: RejectReason::DuplicateId,
                });
                continue;
            }

            pool.sections
                .entry(item.section.clone())
                .or_default()
                .entry(item.sub_skill.clone())
                .or_default()
                .entry(item.difficulty)
                .or_default()
                .push(item);
            pool.len += 1;
        }

        debug!(
            items = pool.len,
            sections = pool.sections.len(),
            rejected = pool.rejected.len(),
            "indexed question pool"
        );
        pool
    }

    /// Number of valid items in the pool.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pool holds no valid items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rows refused during indexing.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Section names in first-seen order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Every (section, sub-skill) pair with its cells, in first-seen order.
    pub fn skills(&self) -> impl Iterator<Item = (&str, &str, &CellMap)> {
        self.sections.iter().flat_map(|(section, skills)| {
            skills
                .iter()
                .map(move |(sub_skill, cells)| (section.as_str(), sub_skill.as_str(), cells))
        })
    }

    /// Items of a single cell; empty when the cell is not populated.
    pub fn cell(&self, section: &str, sub_skill: &str, difficulty: Difficulty) -> &[Item] {
        self.sections
            .get(section)
            .and_then(|skills| skills.get(sub_skill))
            .and_then(|cells| cells.get(&difficulty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All items of a section across its sub-skills and difficulties.
    pub fn section_items<'a>(&'a self, section: &str) -> impl Iterator<Item = &'a Item> + 'a {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|skills| skills.values())
            .flat_map(|cells| cells.values())
            .flatten()
    }

    /// Every valid item in the pool.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections
            .values()
            .flat_map(|skills| skills.values())
            .flat_map(|cells| cells.values())
            .flatten()
    }
}
