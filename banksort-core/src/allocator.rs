//! Stage driver that owns the tracker and the random source for one run.
//!
//! Stages must run as diagnostic → practice (each instance) → drill. Callers
//! that persist between stages step through them one by one; everyone else
//! calls [`Allocator::run`].

use rand::Rng;

use crate::config::AllocationConfig;
use crate::diagnostic::select_diagnostic;
use crate::drill::{DrillBucket, sweep_drills};
use crate::error::{Error, Result};
use crate::item::Item;
use crate::label::SetLabel;
use crate::pool::IndexedPool;
use crate::practice::{PracticeSet, fill_instance};
use crate::tracker::AssignmentTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Diagnostic,
    Practice(u32),
    Drill,
    Done,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Self::Diagnostic => "diagnostic",
            Self::Practice(_) => "practice",
            Self::Drill => "drill",
            Self::Done => "done",
        }
    }
}

/// Allocates one indexed pool.
pub struct Allocator<'a, R> {
    pool: &'a IndexedPool,
    config: &'a AllocationConfig,
    tracker: AssignmentTracker,
    rng: R,
    stage: Stage,
}

impl<'a, R: Rng> Allocator<'a, R> {
    /// Create an allocator; fails if `config` is invalid.
    pub fn new(pool: &'a IndexedPool, config: &'a AllocationConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            tracker: AssignmentTracker::new(),
            rng,
            stage: Stage::Diagnostic,
        })
    }

    /// Items claimed so far.
    pub fn tracker(&self) -> &AssignmentTracker {
        &self.tracker
    }

    /// Whether the drill sweep has completed.
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Run the diagnostic stage.
    pub fn diagnostic(&mut self) -> Result<Vec<Item>> {
        self.expect(Stage::Diagnostic)?;
        let items = select_diagnostic(self.pool, &mut self.tracker, &mut self.rng)?;
        self.stage = Stage::Practice(1);
        Ok(items)
    }

    /// Fill the next practice instance, or `None` once all are filled.
    pub fn next_practice(&mut self) -> Result<Option<PracticeSet>> {
        let instance = match self.stage {
            Stage::Practice(n) => n,
            Stage::Drill | Stage::Done => return Ok(None),
            Stage::Diagnostic => {
                return Err(Error::StageOrder {
                    requested: "practice",
                    expected: Stage::Diagnostic.name(),
                });
            }
        };
        let set = fill_instance(
            self.pool,
            &mut self.tracker,
            instance,
            &self.config.sections,
            &mut self.rng,
        )?;
        self.stage = if instance >= self.config.practice_instances {
            Stage::Drill
        } else {
            Stage::Practice(instance + 1)
        };
        Ok(Some(set))
    }

    /// Sweep the leftovers into drill buckets. Requires every practice
    /// instance to be filled.
    pub fn drills(&mut self) -> Result<Vec<DrillBucket>> {
        self.expect(Stage::Drill)?;
        let buckets = sweep_drills(self.pool, &mut self.tracker)?;
        self.stage = Stage::Done;
        Ok(buckets)
    }

    /// Run every stage in order.
    pub fn run(mut self) -> Result<Allocation> {
        let diagnostic = self.diagnostic()?;
        let mut practice = Vec::with_capacity(self.config.practice_instances as usize);
        while let Some(set) = self.next_practice()? {
            practice.push(set);
        }
        let drills = self.drills()?;
        Ok(Allocation {
            diagnostic,
            practice,
            drills,
        })
    }

    fn expect(&self, wanted: Stage) -> Result<()> {
        let matches = match (self.stage, wanted) {
            (Stage::Practice(_), Stage::Practice(_)) => true,
            (current, wanted) => current == wanted,
        };
        if matches {
            Ok(())
        } else {
            Err(Error::StageOrder {
                requested: wanted.name(),
                expected: self.stage.name(),
            })
        }
    }
}

/// Outcome of a complete allocation.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub diagnostic: Vec<Item>,
    pub practice: Vec<PracticeSet>,
    pub drills: Vec<DrillBucket>,
}

impl Allocation {
    /// Every set in stage order with its items.
    pub fn sets(&self) -> Vec<(SetLabel, &[Item])> {
        let mut sets = vec![(SetLabel::Diagnostic, self.diagnostic.as_slice())];
        sets.extend(
            self.practice
                .iter()
                .map(|set| (set.label.clone(), set.items.as_slice())),
        );
        sets.extend(
            self.drills
                .iter()
                .map(|bucket| (bucket.label.clone(), bucket.items.as_slice())),
        );
        sets
    }

    /// Total number of assigned items.
    pub fn len(&self) -> usize {
        self.sets().iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
