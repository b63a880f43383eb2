use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "banksort", about = "Allocate test-bank questions into sets")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign every unassigned question to a diagnostic, practice or drill set
    Allocate(commands::allocate::AllocateArgs),
    /// Count questions per set label
    Status(commands::status::StatusArgs),
    /// Write the planned labels that a previous run failed to write
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Allocate(args) => commands::allocate::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Reconcile(args) => commands::reconcile::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn allocate_flags_parse() {
        let cli = Cli::parse_from([
            "banksort",
            "allocate",
            "--test-type",
            "EduTest",
            "--seed",
            "42",
            "--dry-run",
        ]);
        let Commands::Allocate(args) = cli.command else {
            panic!("expected allocate");
        };
        assert_eq!(args.test_type.as_deref(), Some("EduTest"));
        assert_eq!(args.seed, Some(42));
        assert!(args.dry_run);
    }

    #[test]
    fn reconcile_requires_plan() {
        assert!(Cli::try_parse_from(["banksort", "reconcile"]).is_err());
        assert!(Cli::try_parse_from(["banksort", "-v", "reconcile", "--plan", "p.json"]).is_ok());
    }
}
