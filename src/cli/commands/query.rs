use clap::Args;

use super::load_config;
use crate::bio::taxon::{Taxon, TaxonRef};
use crate::cli::output::{create_standard_table, header_cell, section_header};
use crate::core::export::download_sql;
use crate::core::filters::{serialize_for_rest, serialize_for_sql, ActiveFilterSet, Filter, MAP_KINDS, MENU_KINDS};
use crate::core::query::{build_query, map_sql};

/// Compose queries offline. Without the ancestry from the API only the
/// taxon's own rank column appears in the WHERE clause.
#[derive(Args)]
pub struct QueryArgs {
    /// Taxon id
    #[arg(value_name = "ID")]
    pub id: String,

    /// Navigation level of the taxon (root = 0)
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Filter as field=value, field=min..max or lat,lon,radius (repeatable)
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<Filter>,
}

pub fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let level = args.level.unwrap_or(config.defaults.level);
    let reference = TaxonRef::new(args.id, level);
    let taxon = Taxon::from_ref(reference.clone());
    let filters: ActiveFilterSet = args.filters.into_iter().collect();

    let columns = &config.taxonomy.rank_columns;
    let table_name = &config.map.table;
    let taxon_where = taxon.sql_where(columns);

    section_header(&format!("Queries for {}", reference));
    let mut table = create_standard_table();
    table.set_header(vec![header_cell("Query"), header_cell("Value")]);
    table.add_row(vec!["Node path".to_string(), build_query(&reference, false, None)]);
    table.add_row(vec![
        "Children path".to_string(),
        build_query(&reference, true, Some(&filters)),
    ]);
    table.add_row(vec!["REST filters".to_string(), serialize_for_rest(&filters, MENU_KINDS)]);
    table.add_row(vec!["SQL filters".to_string(), serialize_for_sql(&filters, MAP_KINDS)]);
    table.add_row(vec!["WHERE".to_string(), taxon_where.trim().to_string()]);
    table.add_row(vec!["Map SQL".to_string(), map_sql(table_name, &taxon_where, &filters)]);
    table.add_row(vec![
        "Download SQL".to_string(),
        download_sql(table_name, &taxon, columns, &filters),
    ]);
    println!("{}", table);

    Ok(())
}
