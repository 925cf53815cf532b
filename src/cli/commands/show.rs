use clap::Args;
use serde::Serialize;

use super::{ensure_loaded, load_config, open_navigator, print_breadcrumb, print_filters, print_menu, TaxonArgs};
use crate::api::HttpTaxonSource;
use crate::cli::output::{info, spinner};
use crate::core::breadcrumb::Breadcrumb;
use crate::core::menu::Menu;
use crate::core::navigator::NavState;

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub taxon: TaxonArgs,

    /// Print the breadcrumb, menu and map query as JSON
    #[arg(long)]
    pub json: bool,

    /// Breadcrumb entries shown before collapsing the middle
    #[arg(long, default_value_t = super::DEFAULT_MAX_CRUMBS)]
    pub max_crumbs: usize,
}

#[derive(Serialize)]
struct ShowReport<'a> {
    breadcrumb: &'a Breadcrumb,
    menu: Option<&'a Menu>,
    map_sql: Option<&'a str>,
    error: Option<String>,
}

pub fn run(args: ShowArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let source = HttpTaxonSource::new(&config.api)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let progress = (!args.json).then(|| spinner("Loading taxon..."));
    let navigator = runtime.block_on(open_navigator(&args.taxon, &config, &source));
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if args.json {
        let report = ShowReport {
            breadcrumb: navigator.breadcrumb(),
            menu: navigator.menu(),
            map_sql: navigator.map_sql(),
            error: match navigator.state() {
                NavState::Error(err) => Some(err.to_string()),
                _ => None,
            },
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return ensure_loaded(&navigator);
    }

    ensure_loaded(&navigator)?;

    print_breadcrumb(navigator.breadcrumb(), args.max_crumbs);
    if let Some(menu) = navigator.menu() {
        print_menu(menu);
    }
    print_filters(navigator.active_filters());
    if let Some(sql) = navigator.map_sql() {
        info(&format!("Map query: {}", sql));
    }

    Ok(())
}
