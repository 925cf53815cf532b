use clap::Args;
use colored::*;

use super::load_config;
use crate::api::{HttpTaxonSource, TaxonSource};
use crate::bio::taxonomy::TaxonomicRank;
use crate::cli::output::{create_standard_table, empty, header_cell, section_header, spinner};

#[derive(Args)]
pub struct SearchArgs {
    /// Taxon name, or the start of one
    #[arg(value_name = "TERM", required = true, num_args = 1..)]
    pub term: Vec<String>,

    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SearchArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let source = HttpTaxonSource::new(&config.api)?;
    let term = args.term.join(" ");

    let runtime = tokio::runtime::Runtime::new()?;
    let progress = (!args.json).then(|| spinner(format!("Searching for {}...", term)));
    let matches = runtime.block_on(source.search(&term));
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    let matches = matches?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    section_header(&format!("Matches for \"{}\"", term));
    if matches.is_empty() {
        empty(&format!("Couldn't find a taxon named {}", term));
        return Ok(());
    }

    let mut table = create_standard_table();
    table.set_header(vec![header_cell("Id"), header_cell("Level"), header_cell("Rank")]);
    for found in &matches {
        let rank = TaxonomicRank::from_level(found.level)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![found.id.clone(), found.level.to_string(), rank]);
    }
    println!("{}", table);
    println!(
        "{} taxomap show {} --level {}",
        "Open the best match with:".dimmed(),
        matches[0].id,
        matches[0].level
    );

    Ok(())
}
