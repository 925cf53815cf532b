use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input, Select};

use super::{load_config, open_navigator, print_breadcrumb, print_filters, print_menu, TaxonArgs};
use crate::api::HttpTaxonSource;
use crate::bio::taxon::TaxonRef;
use crate::cli::output::{error, info, spinner};
use crate::core::filters::{ActiveFilterSet, Filter};
use crate::core::navigator::{NavError, NavState, Navigator};

#[derive(Args)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub taxon: TaxonArgs,

    /// Breadcrumb entries shown before collapsing the middle
    #[arg(long, default_value_t = super::DEFAULT_MAX_CRUMBS)]
    pub max_crumbs: usize,
}

enum Choice {
    Up,
    Open(TaxonRef),
    AddFilter,
    ClearFilters,
    Quit,
}

pub fn run(args: BrowseArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let source = HttpTaxonSource::new(&config.api)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let progress = spinner("Loading taxon...");
    let mut navigator = runtime.block_on(open_navigator(&args.taxon, &config, &source));
    progress.finish_and_clear();
    report(navigator.state());

    loop {
        println!();
        print_breadcrumb(navigator.breadcrumb(), args.max_crumbs);
        if let Some(menu) = navigator.menu() {
            print_menu(menu);
        }
        print_filters(navigator.active_filters());

        let choices = choices(&navigator);
        let labels: Vec<&str> = choices.iter().map(|(label, _)| label.as_str()).collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Go to")
            .items(&labels)
            .default(0)
            .interact_opt()?;

        let Some(index) = selection else {
            break;
        };

        let state = match &choices[index].1 {
            Choice::Quit => break,
            Choice::Up => {
                let progress = spinner("Loading parent...");
                let state = runtime.block_on(navigator.go_up(&source));
                progress.finish_and_clear();
                state
            }
            Choice::Open(taxon) => {
                let progress = spinner(format!("Loading {}...", taxon.id));
                let state = runtime.block_on(navigator.select_taxon(&source, taxon.clone()));
                progress.finish_and_clear();
                state
            }
            Choice::AddFilter => {
                let input: String = Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Filter (field=value, field=min..max or lat,lon,radius)")
                    .interact_text()?;
                let filter = match input.parse::<Filter>() {
                    Ok(filter) => filter,
                    Err(e) => {
                        error(&e.to_string());
                        continue;
                    }
                };
                let filters = navigator.active_filters().clone().with(filter);
                runtime.block_on(navigator.set_filters(&source, filters))
            }
            Choice::ClearFilters => runtime.block_on(navigator.set_filters(&source, ActiveFilterSet::new())),
        };
        report(&state);
    }

    if let Some(sql) = navigator.map_sql() {
        info(&format!("Map query: {}", sql));
    }
    Ok(())
}

fn choices(navigator: &Navigator) -> Vec<(String, Choice)> {
    let mut choices = Vec::new();

    if let Some(menu) = navigator.menu() {
        if let Some(parent) = &menu.parent {
            choices.push((format!("{} {}", parent.name, parent.id), Choice::Up));
        }
        for item in &menu.items {
            choices.push((item.label(), Choice::Open(item.to_ref())));
        }
    }

    // Every crumb but the current one is a jump target
    let crumbs = navigator.breadcrumb().crumbs();
    for crumb in crumbs.iter().take(crumbs.len().saturating_sub(1)).rev() {
        choices.push((
            format!("⤴ {}", crumb.name),
            Choice::Open(TaxonRef::new(crumb.id.clone(), crumb.level)),
        ));
    }

    choices.push(("Add filter…".to_string(), Choice::AddFilter));
    if !navigator.active_filters().is_empty() {
        choices.push(("Clear filters".to_string(), Choice::ClearFilters));
    }
    choices.push(("Quit".to_string(), Choice::Quit));
    choices
}

fn report(state: &NavState) {
    match state {
        NavState::Error(NavError::NoChildren) | NavState::Ready | NavState::Idle => {}
        NavState::Error(err) => error(&err.to_string()),
        NavState::Loading { seq } => error(&format!("Request #{} did not complete", seq)),
    }
}
