//! Storage side of banksort.
//!
//! Connects the allocation engine to the question bank: fetches the raw pool,
//! runs the allocator stage by stage, and writes each item's set label back.
//!
//! # Key Types
//!
//! - [`QuestionSource`] / [`ItemSink`] - Traits for reading the pool and writing labels
//! - [`PostgrestStore`] - PostgREST implementation of both
//! - [`InMemoryStore`] - In-memory implementation for tests and dry runs
//! - [`Persister`] - Batched, concurrent, retrying label writer
//! - [`run`] - One complete allocation run
//! - [`reconcile`] - Re-applies a saved plan to items whose writes were lost
//! - [`census`] - Label counts for a test type

pub mod census;
pub mod error;
pub mod memory;
pub mod persister;
pub mod pipeline;
pub mod postgrest;
pub mod reconcile;
pub mod traits;

// Re-exports
pub use census::{LabelCensus, census};
pub use error::{Error, Result, SinkError};
pub use memory::InMemoryStore;
pub use persister::{PersistConfig, PersistOutcome, Persister};
pub use pipeline::{RunReport, RunRequest, run};
pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use reconcile::{ReconcileReport, reconcile};
pub use traits::{CensusRow, ItemSink, QuestionSource};
