//! Allocation engine for test-bank items.
//!
//! Partitions a pool of tagged questions into disjoint sets:
//! - a diagnostic set with one item per (section, sub-skill, difficulty) cell
//! - K practice sets with fixed per-section quotas
//! - drill buckets, one per sub-skill, holding whatever is left
//!
//! # Architecture
//!
//! ```text
//! RawItem* ──▶ IndexedPool ──▶ Allocator ──▶ diagnostic ─┐
//!                                 │        ├─▶ practice_1..K
//!                    AssignmentTracker     └─▶ drill-<sub-skill>
//! ```
//!
//! All stages share one [`AssignmentTracker`], owned by the [`Allocator`] and
//! lent to each stage in turn, so no item can land in two sets. Randomness is
//! injected, which makes a seeded run reproducible.

mod allocator;
mod config;
mod error;
mod item;
mod label;
mod plan;
mod stats;
mod summary;
mod tracker;

pub mod diagnostic;
pub mod drill;
pub mod pool;
pub mod practice;

pub use allocator::{Allocation, Allocator};
pub use config::{AllocationConfig, DEFAULT_PRACTICE_INSTANCES, SectionQuota};
pub use drill::DrillBucket;
pub use error::{Error, Result};
pub use item::{Cell, Difficulty, Item, ItemId, RawItem, RejectReason, Rejection};
pub use label::{RAW_LABEL, SetLabel};
pub use plan::{AllocationPlan, PlannedAssignment, RunId};
pub use pool::IndexedPool;
pub use practice::{PracticeSet, Shortfall};
pub use stats::{AssignmentStats, FailedWrite};
pub use summary::{Summary, WriteTally};
pub use tracker::AssignmentTracker;
