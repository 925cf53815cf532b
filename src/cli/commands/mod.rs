pub mod browse;
pub mod config;
pub mod download;
pub mod query;
pub mod search;
pub mod show;

use clap::Args;
use colored::*;

use crate::api::HttpTaxonSource;
use crate::cli::output::{create_standard_table, empty, format_number, header_cell, section_header, warning};
use crate::core::breadcrumb::Breadcrumb;
use crate::core::config::Config;
use crate::core::filters::{ActiveFilterSet, Filter};
use crate::core::menu::Menu;
use crate::core::navigator::{NavError, NavState, Navigator};
use crate::core::params::PageParams;
use crate::TaxomapError;

/// Breadcrumb entries shown before the middle collapses into an ellipsis
pub const DEFAULT_MAX_CRUMBS: usize = 6;

/// Taxon selection shared by the commands that load one from the API
#[derive(Args, Debug, Clone)]
pub struct TaxonArgs {
    /// Taxon id (defaults to the configured start taxon)
    #[arg(value_name = "ID")]
    pub id: Option<String>,

    /// Navigation level of the taxon (root = 0)
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Look the taxon up by name instead of id
    #[arg(short, long, value_name = "NAME", conflicts_with = "id")]
    pub search: Option<String>,

    /// Filter as field=value, field=min..max or lat,lon,radius (repeatable)
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<Filter>,
}

impl TaxonArgs {
    pub fn page_params(&self, config: &Config) -> PageParams {
        let mut params = PageParams::defaults(&config.defaults);
        if let Some(id) = &self.id {
            params.taxon.id = id.clone();
        }
        if let Some(level) = self.level {
            params.taxon.level = level;
        }
        params.taxon_search = self.search.clone();
        params
    }

    pub fn filter_set(&self) -> ActiveFilterSet {
        self.filters.iter().cloned().collect()
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(Config::load_or_default()?)
}

/// Navigator with the requested filters, after loading the requested taxon
pub async fn open_navigator(args: &TaxonArgs, config: &Config, source: &HttpTaxonSource) -> Navigator {
    let mut navigator = Navigator::from_config(config).with_filters(args.filter_set());
    navigator.start(source, &args.page_params(config)).await;
    navigator
}

/// Turn a failed navigation into an error; a taxon without children still counts as loaded
pub fn ensure_loaded(navigator: &Navigator) -> anyhow::Result<()> {
    match navigator.state() {
        NavState::Ready | NavState::Error(NavError::NoChildren) => Ok(()),
        NavState::Error(err) => Err(TaxomapError::from(err.clone()).into()),
        NavState::Idle | NavState::Loading { .. } => Err(anyhow::anyhow!("Navigation did not complete")),
    }
}

pub fn print_breadcrumb(breadcrumb: &Breadcrumb, max_crumbs: usize) {
    let (crumbs, collapsed) = breadcrumb.display_window(max_crumbs);
    let last = crumbs.len().saturating_sub(1);

    let mut parts: Vec<String> = Vec::with_capacity(crumbs.len() + 1);
    for (i, crumb) in crumbs.iter().enumerate() {
        if i == last {
            parts.push(crumb.name.bold().to_string());
        } else {
            parts.push(crumb.name.dimmed().to_string());
        }
        if i == 0 && collapsed {
            parts.push("…".dimmed().to_string());
        }
    }
    println!("{}", parts.join(&" › ".dimmed().to_string()));
}

pub fn print_menu(menu: &Menu) {
    section_header(&menu.title);
    if let Some(parent) = &menu.parent {
        println!("  {} {}", parent.name.cyan(), parent.id.dimmed());
    }
    if let Some(message) = &menu.message {
        warning(message);
    }
    if menu.items.is_empty() {
        if menu.message.is_none() {
            empty("No subtaxa");
        }
        return;
    }

    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Name"),
        header_cell("Id"),
        header_cell("Level"),
        header_cell("Occurrences"),
    ]);
    for item in &menu.items {
        table.add_row(vec![
            item.name.clone(),
            item.id.clone(),
            item.level.to_string(),
            item.count.map(format_number).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);
}

pub fn print_filters(filters: &ActiveFilterSet) {
    if filters.is_empty() {
        return;
    }
    let conditions: Vec<String> = filters.iter().map(|f| f.sql_condition()).collect();
    println!("{} {}", "Filters:".dimmed(), conditions.join(", "));
}
