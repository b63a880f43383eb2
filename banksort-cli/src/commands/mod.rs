pub mod allocate;
pub mod config;
pub mod reconcile;
pub mod status;
