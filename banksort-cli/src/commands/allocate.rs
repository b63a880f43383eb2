//! Allocate every unassigned question of a test type into sets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use banksort_core::AllocationPlan;
use banksort_store::{ItemSink, PostgrestStore, QuestionSource, RunReport, RunRequest};
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config::{BanksortConfig, ConfigLoader};

#[derive(Args, Debug, Default)]
pub struct AllocateArgs {
    /// Test type to allocate (defaults to allocation.test_type)
    #[arg(long)]
    pub test_type: Option<String>,

    /// Seed for a reproducible allocation (defaults to allocation.seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Allocate and report without writing any labels
    #[arg(long)]
    pub dry_run: bool,

    /// Where to write the plan file (defaults to the banksort data directory)
    #[arg(long)]
    pub plan_out: Option<PathBuf>,
}

pub async fn run(args: AllocateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    config.validate().context("invalid configuration")?;
    let store = PostgrestStore::new(config.store.postgrest()?)?;

    let (report, plan_path) = allocate(&store, &store, &config, &args).await?;

    println!("{}", report.summary);
    if let Some(path) = plan_path {
        println!("Plan written to {}", path.display());
    }
    Ok(())
}

/// Run the allocation and save its plan; returns the report and plan path.
pub async fn allocate<Src, Snk>(
    source: &Src,
    sink: &Snk,
    config: &BanksortConfig,
    args: &AllocateArgs,
) -> Result<(RunReport, Option<PathBuf>)>
where
    Src: QuestionSource + ?Sized,
    Snk: ItemSink + ?Sized,
{
    let test_type = args
        .test_type
        .clone()
        .unwrap_or_else(|| config.allocation.test_type.clone());
    let seed = args.seed.or(config.allocation.seed);
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut request = RunRequest::new(&test_type).dry_run(args.dry_run);
    request.seed = seed;
    info!(test_type = %test_type, ?seed, dry_run = args.dry_run, "starting allocation");

    let report = banksort_store::run(
        source,
        sink,
        &config.allocation.engine(),
        &config.persist,
        &request,
        rng,
    )
    .await
    .with_context(|| format!("allocation of {test_type} failed"))?;

    if report.plan.is_empty() {
        return Ok((report, None));
    }
    let path = args
        .plan_out
        .clone()
        .unwrap_or_else(|| default_plan_path(&banksort_paths::plans_dir(), &report.plan));
    if let Err(e) = report.plan.save(&path) {
        // Labels are already written at this point.
        warn!(path = %path.display(), error = %e, "could not save plan");
        return Ok((report, None));
    }
    Ok((report, Some(path)))
}

fn default_plan_path(dir: &Path, plan: &AllocationPlan) -> PathBuf {
    let slug: String = plan
        .test_type
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    dir.join(format!("{slug}-{}.json", plan.run_id))
}
