pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taxomap",
    version,
    about = "Browse a taxonomy and compose filtered occurrence queries",
    long_about = "Taxomap walks a taxonomic hierarchy served by a taxon REST API, keeping the \
                  breadcrumb, the drill-down menu and the occurrence map query in step with \
                  the selected taxon and the active filters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to $TAXOMAP_HOME/config.toml)
    #[arg(long, value_name = "PATH", global = true, env = "TAXOMAP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a taxon and print its breadcrumb, children and map query
    Show(commands::show::ShowArgs),

    /// Drill through the hierarchy interactively
    Browse(commands::browse::BrowseArgs),

    /// Search taxa by name
    Search(commands::search::SearchArgs),

    /// Print the API paths and SQL for a taxon without contacting the API
    Query(commands::query::QueryArgs),

    /// Build (and optionally fetch) an occurrence download link
    Download(commands::download::DownloadArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}
