//! Inspect the merged configuration and where banksort keeps its files.

use std::fmt::Write as _;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{BanksortConfig, ConfigLoader};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML, with the store key masked
    Show,
    /// Print the config files and plan directory banksort reads and writes
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = ConfigLoader::load()?;
            println!("{}", render_config(&config)?);
        }
        ConfigCommands::Path => println!("{}", render_paths()),
    }
    Ok(())
}

fn render_config(config: &BanksortConfig) -> Result<String> {
    Ok(toml::to_string_pretty(&config.redacted())?)
}

fn render_paths() -> String {
    let mut out = String::new();
    let locations = [
        ("User config", ConfigLoader::user_config_path()),
        ("Project config", ConfigLoader::project_config_path()),
        ("Plans", banksort_paths::plans_dir()),
    ];
    for (name, path) in locations {
        let _ = writeln!(out, "{:<16}{}", format!("{name}:"), path.display());
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn rendered_config_hides_store_key() {
        let mut config = BanksortConfig::default();
        config.store.api_key = Some("service-role-secret".to_string());

        let text = render_config(&config).unwrap();

        assert!(!text.contains("service-role-secret"));
        assert!(text.contains("[allocation]"));
        assert!(text.contains("test_type = \"EduTest\""));
    }

    #[test]
    #[serial]
    fn rendered_paths_list_every_location() {
        let text = render_paths();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("User config:"));
        assert!(lines[1].starts_with("Project config:"));
        assert!(lines[2].starts_with("Plans:"));
        assert!(lines[2].ends_with("plans"));
    }
}
