/// Navigation controller keeping breadcrumb, menu and map query consistent
///
/// Every navigation runs as a short sequence of requests: the node itself
/// (`taxon/`, unfiltered) and then its children (`subtaxa/`, filtered). A
/// filter change only re-runs the children request for the current taxon,
/// unless a selection is still waiting on its node, which is then restarted.
///
/// Requests are plain messages tagged with a sequence number. The navigator
/// only applies a response whose number matches the latest dispatched one,
/// so a slow answer to an old navigation can never overwrite a newer one.
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::TaxonSource;
use crate::bio::taxon::{ApiRow, Taxon, TaxonRef};
use crate::bio::taxonomy::RankColumns;
use crate::core::breadcrumb::Breadcrumb;
use crate::core::config::Config;
use crate::core::export::{download_url, DownloadFormat};
use crate::core::filters::ActiveFilterSet;
use crate::core::menu::Menu;
use crate::core::params::PageParams;
use crate::core::query::{build_query_for, map_sql, QueryKind};
use crate::TaxomapError;

/// User-facing failure of a single navigation request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("Taxon does not exist")]
    NotFound,

    #[error("No results")]
    NoChildren,

    #[error("An error occurred: {0}")]
    Transport(String),
}

impl From<TaxomapError> for NavError {
    fn from(err: TaxomapError) -> Self {
        match err {
            TaxomapError::NotFound => NavError::NotFound,
            TaxomapError::NoChildren => NavError::NoChildren,
            TaxomapError::Transport(msg) => NavError::Transport(msg),
            other => NavError::Transport(other.to_string()),
        }
    }
}

impl From<NavError> for TaxomapError {
    fn from(err: NavError) -> Self {
        match err {
            NavError::NotFound => TaxomapError::NotFound,
            NavError::NoChildren => TaxomapError::NoChildren,
            NavError::Transport(msg) => TaxomapError::Transport(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Loading { seq: u64 },
    Ready,
    Error(NavError),
}

/// One outgoing API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub seq: u64,
    pub kind: QueryKind,
    pub taxon: TaxonRef,
    /// Path relative to the API base URL
    pub path: String,
}

#[derive(Debug)]
pub struct Response {
    pub request: Request,
    pub outcome: crate::Result<Vec<ApiRow>>,
}

/// Notifications for dependent views
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Loading { seq: u64, taxon: TaxonRef },
    Breadcrumb(Breadcrumb),
    Menu(Menu),
    MapSql(String),
    Ready(TaxonRef),
    Failed(NavError),
}

/// The parts of [`Config`] the navigator needs
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorSettings {
    pub table: String,
    pub root_name: String,
    pub rank_columns: RankColumns,
}

impl From<&Config> for NavigatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            table: config.map.table.clone(),
            root_name: config.taxonomy.root_name.clone(),
            rank_columns: config.taxonomy.rank_columns.clone(),
        }
    }
}

pub struct Navigator {
    settings: NavigatorSettings,
    state: NavState,
    current: Option<Taxon>,
    active_filters: ActiveFilterSet,
    breadcrumb: Breadcrumb,
    menu: Option<Menu>,
    map_sql: Option<String>,
    seq: u64,
    pending: Option<TaxonRef>,
    subscribers: Vec<UnboundedSender<NavEvent>>,
}

impl Navigator {
    pub fn new(settings: NavigatorSettings) -> Self {
        let breadcrumb = Breadcrumb::root_only(&settings.root_name);
        Self {
            settings,
            state: NavState::Idle,
            current: None,
            active_filters: ActiveFilterSet::new(),
            breadcrumb,
            menu: None,
            map_sql: None,
            seq: 0,
            pending: None,
            subscribers: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(NavigatorSettings::from(config))
    }

    /// Start with `filters` already active
    pub fn with_filters(mut self, filters: ActiveFilterSet) -> Self {
        self.active_filters = filters;
        self
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<NavEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn current_taxon(&self) -> Option<&Taxon> {
        self.current.as_ref()
    }

    pub fn active_filters(&self) -> &ActiveFilterSet {
        &self.active_filters
    }

    pub fn breadcrumb(&self) -> &Breadcrumb {
        &self.breadcrumb
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    /// Latest SQL handed to the map layer
    pub fn map_sql(&self) -> Option<&str> {
        self.map_sql.as_deref()
    }

    /// Sequence number of the latest dispatched request
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    /// Download link for the current selection with every filter applied
    pub fn download_url(&self, sql_api: &str, format: DownloadFormat) -> Option<String> {
        let taxon = self.current.as_ref()?;
        Some(download_url(
            sql_api,
            &self.settings.table,
            taxon,
            &self.settings.rank_columns,
            &self.active_filters,
            format,
        ))
    }

    /// Start navigating to `taxon`; the node request carries no filters
    pub fn dispatch_select(&mut self, taxon: TaxonRef) -> Request {
        let seq = self.next_seq(&taxon);
        self.pending = Some(taxon.clone());
        Request {
            seq,
            kind: QueryKind::Node,
            path: build_query_for(QueryKind::Node, &taxon, None),
            taxon,
        }
    }

    /// Replace the active filters and refresh the map query right away.
    ///
    /// Returns the children request for the current taxon, or `None` when
    /// nothing has been selected yet. While a selection is still resolving
    /// its node, that navigation is restarted under the new filters instead.
    pub fn dispatch_filters(&mut self, filters: ActiveFilterSet) -> Option<Request> {
        self.active_filters = filters;

        if let Some(pending) = self.pending.clone() {
            debug!("Filters changed while loading {}, restarting it", pending);
            return Some(self.dispatch_select(pending));
        }

        let taxon = self.current.as_ref()?.reference().clone();
        self.refresh_map_sql();
        let seq = self.next_seq(&taxon);
        Some(self.children_request(seq, taxon))
    }

    /// Apply a response, returning the follow-up request if the navigation
    /// continues. Responses to superseded requests are dropped.
    pub fn apply(&mut self, response: Response) -> Option<Request> {
        let Response { request, outcome } = response;
        if request.seq != self.seq {
            debug!(
                "Discarding stale response #{} for {} (latest is #{})",
                request.seq, request.taxon, self.seq
            );
            return None;
        }
        if matches!(request.kind, QueryKind::Node) {
            self.pending = None;
        }

        let rows = match outcome {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Request {} failed: {}", request.path, e);
                self.fail(NavError::from(e));
                return None;
            }
        };

        match request.kind {
            QueryKind::Node => self.apply_node(request, rows),
            QueryKind::Children => {
                self.apply_children(request, rows);
                None
            }
        }
    }

    /// Drive `request` and any follow-ups to completion against `source`
    pub async fn run<S: TaxonSource + ?Sized>(&mut self, source: &S, request: Request) -> NavState {
        let mut next = Some(request);
        while let Some(request) = next.take() {
            let outcome = source.fetch(&request.path).await;
            next = self.apply(Response { request, outcome });
        }
        self.state.clone()
    }

    pub async fn select_taxon<S: TaxonSource + ?Sized>(&mut self, source: &S, taxon: TaxonRef) -> NavState {
        let request = self.dispatch_select(taxon);
        self.run(source, request).await
    }

    pub async fn set_filters<S: TaxonSource + ?Sized>(
        &mut self,
        source: &S,
        filters: ActiveFilterSet,
    ) -> NavState {
        match self.dispatch_filters(filters) {
            Some(request) => self.run(source, request).await,
            None => self.state.clone(),
        }
    }

    /// Navigate to the parent of the current selection, if it has one
    pub async fn go_up<S: TaxonSource + ?Sized>(&mut self, source: &S) -> NavState {
        let parent = self
            .current
            .as_ref()
            .and_then(|taxon| taxon.parent())
            .map(|node| node.to_ref());

        match parent {
            Some(parent) => self.select_taxon(source, parent).await,
            None => self.state.clone(),
        }
    }

    /// Load the taxon named by the start-up parameters
    pub async fn start<S: TaxonSource + ?Sized>(&mut self, source: &S, params: &PageParams) -> NavState {
        let initial = params.resolve_initial(source).await;
        info!("Starting at {}", initial);
        self.select_taxon(source, initial).await
    }

    fn next_seq(&mut self, taxon: &TaxonRef) -> u64 {
        self.seq += 1;
        self.state = NavState::Loading { seq: self.seq };
        self.emit(NavEvent::Loading {
            seq: self.seq,
            taxon: taxon.clone(),
        });
        self.seq
    }

    fn children_request(&self, seq: u64, taxon: TaxonRef) -> Request {
        Request {
            seq,
            kind: QueryKind::Children,
            path: build_query_for(QueryKind::Children, &taxon, Some(&self.active_filters)),
            taxon,
        }
    }

    fn apply_node(&mut self, request: Request, mut rows: Vec<ApiRow>) -> Option<Request> {
        let Some(selection) = rows.last_mut() else {
            info!("Taxon {} does not exist", request.taxon);
            self.fail(NavError::NotFound);
            return None;
        };
        // The selection is on the breadcrumb even before its children arrive
        selection.children.get_or_insert_with(Vec::new);

        let mut taxon = Taxon::from_ref(request.taxon.clone());
        if let Err(e) = taxon.convert_from_api(&rows) {
            self.fail(NavError::from(e));
            return None;
        }

        self.current = Some(taxon);
        self.refresh_breadcrumb();
        self.refresh_map_sql();
        Some(self.children_request(request.seq, request.taxon))
    }

    // Only the menu follows a children fetch; the breadcrumb and map query
    // were settled by the node fetch or the filter change.
    fn apply_children(&mut self, request: Request, rows: Vec<ApiRow>) {
        let Some(mut taxon) = self.current.take() else {
            warn!("Children of {} arrived without a selection", request.taxon);
            return;
        };

        if rows.is_empty() {
            self.current = Some(taxon);
            self.fail(NavError::NoChildren);
            return;
        }

        let attached = taxon.attach_children(&rows);
        let menu = Menu::from_taxon(&taxon);
        self.current = Some(taxon);
        if let Err(e) = attached {
            self.fail(NavError::from(e));
            return;
        }
        self.set_menu(menu);

        self.state = NavState::Ready;
        self.emit(NavEvent::Ready(request.taxon));
    }

    fn refresh_breadcrumb(&mut self) {
        let Some(tree) = self.current.as_ref().and_then(|t| t.tree()) else {
            return;
        };
        let breadcrumb = Breadcrumb::from_tree(tree, &self.settings.root_name);
        if breadcrumb != self.breadcrumb {
            self.breadcrumb = breadcrumb.clone();
            self.emit(NavEvent::Breadcrumb(breadcrumb));
        }
    }

    fn refresh_map_sql(&mut self) {
        let Some(taxon) = &self.current else {
            return;
        };
        let sql = map_sql(
            &self.settings.table,
            &taxon.sql_where(&self.settings.rank_columns),
            &self.active_filters,
        );
        if self.map_sql.as_deref() != Some(sql.as_str()) {
            debug!("Map SQL: {}", sql);
            self.map_sql = Some(sql.clone());
            self.emit(NavEvent::MapSql(sql));
        }
    }

    fn set_menu(&mut self, menu: Menu) {
        self.menu = Some(menu.clone());
        self.emit(NavEvent::Menu(menu));
    }

    /// Enter the error state; the menu of the retained selection shows the message
    fn fail(&mut self, error: NavError) {
        if let Some(taxon) = &self.current {
            let menu = Menu::with_message(taxon, error.to_string());
            self.set_menu(menu);
        }
        self.state = NavState::Error(error.clone());
        self.emit(NavEvent::Failed(error));
    }

    fn emit(&mut self, event: NavEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::Filter;
    use pretty_assertions::assert_eq;

    fn navigator() -> Navigator {
        Navigator::from_config(&Config::default())
    }

    fn animalia_node() -> Vec<ApiRow> {
        vec![
            ApiRow::new("Eukaryota", "Eukaryota"),
            ApiRow::new("Animalia", "Animalia"),
        ]
    }

    fn animalia_children() -> Vec<ApiRow> {
        vec![ApiRow::new("Animalia", "Animalia").with_children(vec![
            ApiRow::new("Chordata", "Chordata").with_count(10),
            ApiRow::new("Mollusca", "Mollusca").with_count(4),
        ])]
    }

    fn chordata_node() -> Vec<ApiRow> {
        vec![
            ApiRow::new("Eukaryota", "Eukaryota"),
            ApiRow::new("Animalia", "Animalia"),
            ApiRow::new("Chordata", "Chordata"),
        ]
    }

    fn respond(request: Request, rows: Vec<ApiRow>) -> Response {
        Response {
            request,
            outcome: Ok(rows),
        }
    }

    #[test]
    fn test_select_walks_node_then_children() {
        let mut nav = navigator();
        let node = nav.dispatch_select(TaxonRef::new("Animalia", 1));
        assert_eq!(node.path, "taxon/Animalia/1/");
        assert_eq!(nav.state(), &NavState::Loading { seq: 1 });

        let children = nav.apply(respond(node, animalia_node())).unwrap();
        assert_eq!(children.kind, QueryKind::Children);
        assert_eq!(children.seq, 1);
        assert_eq!(children.path, "subtaxa/Animalia/1/?");
        assert_eq!(nav.state(), &NavState::Loading { seq: 1 });

        assert!(nav.apply(respond(children, animalia_children())).is_none());
        assert_eq!(nav.state(), &NavState::Ready);
        assert_eq!(nav.breadcrumb().names(), vec!["Eukaryota", "Animalia"]);
        assert_eq!(nav.menu().unwrap().items.len(), 2);
        assert_eq!(
            nav.map_sql(),
            Some("SELECT * FROM mcnb_prod WHERE \"kingdom\"='Animalia'")
        );
    }

    #[test]
    fn test_children_fetch_keeps_the_ancestry() {
        let mut nav = navigator();
        let node = nav.dispatch_select(TaxonRef::new("Chordata", 2));
        let children = nav.apply(respond(node, chordata_node())).unwrap();
        let subtaxa = vec![ApiRow::new("Chordata", "Chordata")
            .with_children(vec![ApiRow::new("Aves", "Aves").with_count(1200)])];
        assert!(nav.apply(respond(children, subtaxa)).is_none());

        assert_eq!(nav.state(), &NavState::Ready);
        assert_eq!(
            nav.breadcrumb().names(),
            vec!["Eukaryota", "Animalia", "Chordata"]
        );
        let levels: Vec<u32> = nav.breadcrumb().crumbs().iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(
            nav.map_sql(),
            Some("SELECT * FROM mcnb_prod WHERE \"kingdom\"='Animalia' AND \"phylum\"='Chordata'")
        );
        assert_eq!(nav.current_taxon().unwrap().parent().unwrap().id, "Animalia");
        let menu = nav.menu().unwrap();
        assert_eq!(menu.items.len(), 1);
        assert_eq!((menu.items[0].id.as_str(), menu.items[0].level), ("Aves", 3));
    }

    #[test]
    fn test_filters_during_a_pending_selection_restart_it() {
        let mut nav = navigator();
        let node = nav.dispatch_select(TaxonRef::new("Animalia", 1));
        let children = nav.apply(respond(node, animalia_node())).unwrap();
        nav.apply(respond(children, animalia_children()));

        let stale = nav.dispatch_select(TaxonRef::new("Chordata", 2));
        let filters = ActiveFilterSet::new().with(Filter::field_value("kingdom", "Animalia").unwrap());
        let restarted = nav.dispatch_filters(filters).unwrap();
        assert_eq!(restarted.kind, QueryKind::Node);
        assert_eq!(restarted.taxon, TaxonRef::new("Chordata", 2));
        assert_eq!(restarted.path, "taxon/Chordata/2/");

        assert!(nav.apply(respond(stale, chordata_node())).is_none());
        assert_eq!(nav.current_taxon().unwrap().id(), "Animalia");

        let children = nav.apply(respond(restarted, chordata_node())).unwrap();
        assert_eq!(children.path, "subtaxa/Chordata/2/?kingdom=Animalia");
        assert_eq!(nav.current_taxon().unwrap().id(), "Chordata");

        let refilter = nav.dispatch_filters(ActiveFilterSet::new()).unwrap();
        assert_eq!(refilter.kind, QueryKind::Children);
        assert_eq!(refilter.taxon, TaxonRef::new("Chordata", 2));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut nav = navigator();
        let slow = nav.dispatch_select(TaxonRef::new("Plantae", 1));
        let fast = nav.dispatch_select(TaxonRef::new("Animalia", 1));

        let follow_up = nav.apply(respond(fast, animalia_node()));
        assert!(follow_up.is_some());

        assert!(nav
            .apply(respond(slow, vec![ApiRow::new("Plantae", "Plantae")]))
            .is_none());
        assert_eq!(nav.current_taxon().unwrap().id(), "Animalia");
    }

    #[test]
    fn test_not_found_keeps_previous_selection() {
        let mut nav = navigator();
        let node = nav.dispatch_select(TaxonRef::new("Animalia", 1));
        let children = nav.apply(respond(node, animalia_node())).unwrap();
        nav.apply(respond(children, animalia_children()));
        let breadcrumb = nav.breadcrumb().clone();

        let missing = nav.dispatch_select(TaxonRef::new("Dragons", 2));
        assert!(nav.apply(respond(missing, vec![])).is_none());

        assert_eq!(nav.state(), &NavState::Error(NavError::NotFound));
        assert_eq!(nav.current_taxon().unwrap().id(), "Animalia");
        assert_eq!(nav.breadcrumb(), &breadcrumb);
    }

    #[test]
    fn test_filters_survive_errors() {
        let mut nav = navigator();
        let filters = ActiveFilterSet::new().with(Filter::field_value("kingdom", "Animalia").unwrap());
        assert!(nav.dispatch_filters(filters.clone()).is_none());

        let node = nav.dispatch_select(TaxonRef::new("Animalia", 1));
        nav.apply(Response {
            request: node,
            outcome: Err(TaxomapError::Transport("503 Service Unavailable".to_string())),
        });

        assert_eq!(
            nav.state(),
            &NavState::Error(NavError::Transport("503 Service Unavailable".to_string()))
        );
        assert_eq!(nav.active_filters(), &filters);
    }

    #[test]
    fn test_events_are_broadcast() {
        let mut nav = navigator();
        let mut events = nav.subscribe();
        let dropped = nav.subscribe();
        drop(dropped);

        let node = nav.dispatch_select(TaxonRef::new("Animalia", 1));
        let children = nav.apply(respond(node, animalia_node())).unwrap();
        nav.apply(respond(children, animalia_children()));

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert!(matches!(received.first(), Some(NavEvent::Loading { seq: 1, .. })));
        assert!(matches!(received.last(), Some(NavEvent::Ready(_))));
        assert!(received.iter().any(|e| matches!(e, NavEvent::MapSql(_))));
        assert!(received.iter().any(|e| matches!(e, NavEvent::Menu(_))));
        assert_eq!(nav.subscribers.len(), 1);
    }

    #[test]
    fn test_nav_error_messages() {
        assert_eq!(NavError::NotFound.to_string(), "Taxon does not exist");
        assert_eq!(NavError::NoChildren.to_string(), "No results");
        assert_eq!(
            NavError::Transport("404 Not Found".to_string()).to_string(),
            "An error occurred: 404 Not Found"
        );
        assert_eq!(
            NavError::from(TaxomapError::Parse("bad".to_string())),
            NavError::Transport("Parse error: bad".to_string())
        );
    }
}
