use clap::Parser;
use colored::*;
use std::process;
use taxomap::cli::{Cli, Commands};
use taxomap::TaxomapError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize logging with TAXOMAP_LOG environment variable support
    let log_level = std::env::var("TAXOMAP_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<TaxomapError>() {
            Some(TaxomapError::Config(_)) => 2,
            Some(TaxomapError::Io(_)) => 3,
            Some(TaxomapError::Parse(_))
            | Some(TaxomapError::Json(_))
            | Some(TaxomapError::InvalidFilter(_)) => 4,
            Some(TaxomapError::NotFound) | Some(TaxomapError::NoChildren) => 5,
            Some(TaxomapError::Transport(_)) => 6,
            None => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Paths are resolved lazily, so this takes effect for every command
    if let Some(config) = &cli.config {
        std::env::set_var("TAXOMAP_CONFIG", config);
    }

    match cli.command {
        Commands::Show(args) => taxomap::cli::commands::show::run(args),
        Commands::Browse(args) => taxomap::cli::commands::browse::run(args),
        Commands::Search(args) => taxomap::cli::commands::search::run(args),
        Commands::Query(args) => taxomap::cli::commands::query::run(args),
        Commands::Download(args) => taxomap::cli::commands::download::run(args),
        Commands::Config { command } => taxomap::cli::commands::config::run(command),
    }
}
