/// REST paths and map-layer SQL composed from a taxon and the active filters
use url::form_urlencoded;

use crate::bio::taxon::TaxonRef;
use crate::core::filters::{serialize_for_rest, serialize_for_sql, ActiveFilterSet, MAP_KINDS, MENU_KINDS};

/// Which endpoint a taxon query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// `taxon/`: the node and its ancestor chain
    Node,
    /// `subtaxa/`: the node and its immediate children
    Children,
}

impl QueryKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Node => "taxon",
            Self::Children => "subtaxa",
        }
    }
}

/// Relative API path for a taxon.
///
/// `filters: None` means "do not filter" and leaves the query string off
/// entirely; an explicit but empty set still yields a trailing `?`.
pub fn build_query(taxon: &TaxonRef, want_children: bool, filters: Option<&ActiveFilterSet>) -> String {
    let kind = if want_children {
        QueryKind::Children
    } else {
        QueryKind::Node
    };
    build_query_for(kind, taxon, filters)
}

pub fn build_query_for(kind: QueryKind, taxon: &TaxonRef, filters: Option<&ActiveFilterSet>) -> String {
    let mut query = format!("{}/{}/{}/", kind.prefix(), encode_segment(&taxon.id), taxon.level);
    if let Some(filters) = filters {
        query.push('?');
        query.push_str(&serialize_for_rest(filters, MENU_KINDS));
    }
    query
}

/// Relative API path for a free-text taxon search
pub fn search_query(term: &str) -> String {
    format!("search/{}/", encode_segment(term.trim()))
}

/// Percent-encode `value` so it stays a single path segment
fn encode_segment(value: &str) -> String {
    // form encoding writes spaces as '+' and a literal '+' as %2B
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Full SQL for the occurrence map layer: base taxon clause plus map filters
pub fn map_sql(table: &str, taxon_where: &str, filters: &ActiveFilterSet) -> String {
    let filter_sql = serialize_for_sql(filters, MAP_KINDS);
    if filter_sql.is_empty() {
        format!("SELECT * FROM {}{}", table, taxon_where)
    } else {
        format!("SELECT * FROM {}{} {}", table, taxon_where, filter_sql)
    }
}
