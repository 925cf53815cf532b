use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

use super::{ensure_loaded, load_config, open_navigator, TaxonArgs};
use crate::api::HttpTaxonSource;
use crate::cli::output::{info, section_header, spinner, success, tree_item};
use crate::core::export::{DownloadFormat, DOWNLOAD_FILENAME};

#[derive(Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub taxon: TaxonArgs,

    /// Output format: csv, kml, shp or geojson
    #[arg(long, default_value = "csv")]
    pub format: DownloadFormat,

    /// Save the data here instead of printing the link (a directory gets taxomap.<ext>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// List the available formats and exit
    #[arg(long)]
    pub list_formats: bool,
}

pub fn run(args: DownloadArgs) -> anyhow::Result<()> {
    if args.list_formats {
        section_header("Download formats");
        for (i, format) in DownloadFormat::ALL.iter().enumerate() {
            let is_last = i == DownloadFormat::ALL.len() - 1;
            tree_item(is_last, format.api_format(), Some(format.label()));
        }
        return Ok(());
    }

    let config = load_config()?;
    let source = HttpTaxonSource::new(&config.api)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let progress = spinner("Loading taxon...");
    let navigator = runtime.block_on(open_navigator(&args.taxon, &config, &source));
    progress.finish_and_clear();
    ensure_loaded(&navigator)?;

    let url = navigator
        .download_url(&config.map.sql_api, args.format)
        .context("No taxon selected")?;

    let Some(output) = args.output else {
        println!("{}", url);
        return Ok(());
    };

    let target = output_path(&output, args.format);
    info(&format!("Downloading {} as {}", navigator.breadcrumb(), args.format));
    let progress = spinner(format!("Saving {}...", target.display()));
    let written = runtime.block_on(source.download_to(&url, &target));
    progress.finish_and_clear();
    let written = written.with_context(|| format!("Failed to download {}", url))?;

    success(&format!("Saved {} bytes to {}", written, target.display()));
    Ok(())
}

fn output_path(output: &Path, format: DownloadFormat) -> PathBuf {
    if output.is_dir() {
        output.join(format!("{}.{}", DOWNLOAD_FILENAME, format.extension()))
    } else {
        output.to_path_buf()
    }
}
