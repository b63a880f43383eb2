//! Label census for a test type.

use anyhow::{Context, Result};
use banksort_store::{LabelCensus, PostgrestStore, census};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Test type to count (defaults to allocation.test_type)
    #[arg(long)]
    pub test_type: Option<String>,

    /// Print the census as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = PostgrestStore::new(config.store.postgrest()?)?;
    let test_type = args.test_type.unwrap_or(config.allocation.test_type);

    let census = census(&store, &test_type)
        .await
        .with_context(|| format!("cannot count labels for {test_type}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&census)?);
    } else {
        println!("{}", render(&census));
    }
    Ok(())
}

fn render(census: &LabelCensus) -> String {
    let mut out = format!("Label census for {}\n", census.test_type);
    out.push_str(&counts_table("Label", &census.labels).to_string());
    out.push_str(&format!("\nTotal questions: {}", census.total));

    if !census.raw_sections.is_empty() {
        out.push_str(&format!("\n\nUnassigned ({}) by section\n", census.raw()));
        out.push_str(&counts_table("Section", &census.raw_sections).to_string());
    }
    out
}

fn counts_table(key: &str, rows: &[(String, usize)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(key).fg(Color::Cyan),
        Cell::new("Questions").fg(Color::Cyan),
    ]);
    for (name, count) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    table
}
