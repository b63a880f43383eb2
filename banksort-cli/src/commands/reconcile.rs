//! Re-apply a saved plan to items whose label writes failed.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use banksort_core::AllocationPlan;
use banksort_store::{PostgrestStore, reconcile};
use clap::Args;

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Plan file written by `banksort allocate`
    #[arg(long)]
    pub plan: PathBuf,
}

pub async fn run(args: ReconcileArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    config.validate().context("invalid configuration")?;
    let store = PostgrestStore::new(config.store.postgrest()?)?;

    let plan = AllocationPlan::load(&args.plan)
        .with_context(|| format!("cannot load plan {}", args.plan.display()))?;
    let report = reconcile(&store, &store, &config.persist, &plan)
        .await
        .with_context(|| format!("reconciling run {} failed", plan.run_id))?;

    println!("{report}");
    if !report.is_complete() {
        bail!(
            "{} items could not be written; run reconcile again later",
            report.failed.len()
        );
    }
    Ok(())
}
