/// Taxon references, the flat API row format and the nested taxon tree
///
/// The data API answers every taxon request with a flat, root-first list of
/// rows: one row per ancestor, the requested node last, and (for children
/// requests) the immediate children hanging off that last row. [`TaxonTree`]
/// rebuilds that list into a chain of single-child nodes ending at the
/// selection, whose own children become the navigable menu.
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::bio::taxonomy::RankColumns;
use crate::core::filters::{quote_ident, quote_literal};
use crate::{Result, TaxomapError};

/// Identifies a taxon for a query: the id is only unique within its level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonRef {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_level")]
    pub level: u32,
}

impl TaxonRef {
    pub fn new(id: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            level,
        }
    }
}

impl std::fmt::Display for TaxonRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (level {})", self.id, self.level)
    }
}

/// One row of a flat API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRow {
    /// Missing on terminal summary rows, which are not navigable
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_level")]
    pub level: Option<u32>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub children: Option<Vec<ApiRow>>,
}

impl ApiRow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_children(mut self, children: Vec<ApiRow>) -> Self {
        self.children = Some(children);
        self
    }

    fn navigable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Index of a node inside its [`TaxonTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonNode {
    pub id: String,
    pub name: String,
    pub level: u32,
    /// Occurrence count, only reported on children summaries
    pub count: Option<u64>,
    parent: Option<NodeId>,
    /// `None` = not expanded, `Some(empty)` = no descendants
    children: Option<Vec<NodeId>>,
}

impl TaxonNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    pub fn to_ref(&self) -> TaxonRef {
        TaxonRef::new(self.id.clone(), self.level)
    }
}

/// Owned tree produced by a single API round-trip.
///
/// Nodes live in an arena; parent links are plain indices so the tree has a
/// single owner and no reference cycles. The root is always node 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonTree {
    nodes: Vec<TaxonNode>,
    selected: NodeId,
}

impl TaxonTree {
    /// Rebuild the nested tree from a flat, root-first API response.
    ///
    /// Rows without an explicit level are numbered so that the last row lands
    /// on `requested.level`. Children without an id are dropped: they are
    /// summary rows with nothing further to navigate to.
    pub fn from_api(requested: &TaxonRef, rows: &[ApiRow]) -> Result<Self> {
        let last = rows
            .len()
            .checked_sub(1)
            .ok_or_else(|| TaxomapError::Parse("empty taxon response".to_string()))?;

        let base_level = match rows[0].level {
            Some(level) => level,
            None => requested.level.checked_sub(last as u32).ok_or_else(|| {
                TaxomapError::Parse(format!(
                    "{} ancestor rows cannot end at level {}",
                    last, requested.level
                ))
            })?,
        };

        let mut nodes = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let level = u32::try_from(i)
                .ok()
                .and_then(|offset| base_level.checked_add(offset))
                .ok_or_else(|| {
                    TaxomapError::Parse(format!("level of row {} overflows from {}", i, base_level))
                })?;
            if let Some(explicit) = row.level {
                if explicit != level {
                    return Err(TaxomapError::Parse(format!(
                        "row {} has level {} but the chain expects {}",
                        i, explicit, level
                    )));
                }
            }

            let id = match row.navigable_id() {
                Some(id) => id.to_string(),
                None if i == last => requested.id.clone(),
                None => {
                    return Err(TaxomapError::Parse(format!(
                        "ancestor row {} has no id",
                        i
                    )))
                }
            };
            let name = row.name.clone().unwrap_or_else(|| id.clone());

            nodes.push(TaxonNode {
                id,
                name,
                level,
                count: row.count,
                parent: i.checked_sub(1).map(NodeId),
                children: (i < last).then(|| vec![NodeId(i + 1)]),
            });
        }

        let selected = NodeId(last);
        if nodes[last].id != requested.id {
            debug!(
                "API answered {} for requested taxon {}",
                nodes[last].id, requested.id
            );
        }

        let mut tree = Self { nodes, selected };
        if let Some(children) = &rows[last].children {
            tree.replace_children(children)?;
        }
        Ok(tree)
    }

    /// Hang the children of a `subtaxa/` response under the selection.
    ///
    /// Only the last row's `children` are read: the ancestors were already
    /// resolved by the node fetch and stay as they are. A row without a
    /// `children` array leaves the selection expanded with no children.
    pub fn attach_children(&mut self, rows: &[ApiRow]) -> Result<()> {
        let row = rows
            .last()
            .ok_or_else(|| TaxomapError::Parse("empty children response".to_string()))?;
        if let Some(id) = row.navigable_id() {
            if id != self.selected().id {
                debug!(
                    "children response for {} attached under {}",
                    id,
                    self.selected().id
                );
            }
        }
        self.replace_children(row.children.as_deref().unwrap_or(&[]))
    }

    // Children always sit after the chain in the arena, so replacing them is
    // a truncate followed by a push of the new set.
    fn replace_children(&mut self, children: &[ApiRow]) -> Result<()> {
        let selected = self.selected;
        let child_level = self.nodes[selected.0].level.checked_add(1).ok_or_else(|| {
            TaxomapError::Parse(format!(
                "children of level {} overflow",
                self.nodes[selected.0].level
            ))
        })?;

        self.nodes.truncate(selected.0 + 1);
        let mut child_ids = Vec::with_capacity(children.len());
        for child in children {
            let Some(id) = child.navigable_id() else {
                continue;
            };
            child_ids.push(NodeId(self.nodes.len()));
            self.nodes.push(TaxonNode {
                id: id.to_string(),
                name: child.name.clone().unwrap_or_else(|| id.to_string()),
                level: child_level,
                count: child.count,
                parent: Some(selected),
                children: None,
            });
        }
        self.nodes[selected.0].children = Some(child_ids);
        Ok(())
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &TaxonNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &TaxonNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TaxonNode> {
        self.nodes.get(id.0)
    }

    pub fn selected_id(&self) -> NodeId {
        self.selected
    }

    /// Node for the requested taxon, the end of the active chain
    pub fn selected(&self) -> &TaxonNode {
        self.node(self.selected)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&TaxonNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &TaxonNode> {
        self.node(id)
            .children
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(move |c| self.node(*c))
    }

    /// Root-to-selection chain of single-child links
    pub fn active_chain(&self) -> Vec<&TaxonNode> {
        let mut chain = Vec::new();
        let mut current = Some(self.selected);
        while let Some(id) = current {
            let node = self.node(id);
            chain.push(node);
            current = node.parent;
        }
        chain.reverse();
        chain
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A selected taxon and, once loaded, its tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxon {
    reference: TaxonRef,
    tree: Option<TaxonTree>,
}

impl Taxon {
    pub fn new(id: impl Into<String>, level: u32) -> Self {
        Self::from_ref(TaxonRef::new(id, level))
    }

    pub fn from_ref(reference: TaxonRef) -> Self {
        Self {
            reference,
            tree: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.reference.id
    }

    pub fn level(&self) -> u32 {
        self.reference.level
    }

    pub fn reference(&self) -> &TaxonRef {
        &self.reference
    }

    pub fn tree(&self) -> Option<&TaxonTree> {
        self.tree.as_ref()
    }

    /// Replace the tree with one rebuilt from `rows`.
    ///
    /// Callers reject empty responses before getting here; on a malformed
    /// response the previous tree is left untouched.
    pub fn convert_from_api(&mut self, rows: &[ApiRow]) -> Result<()> {
        let tree = TaxonTree::from_api(&self.reference, rows)?;
        debug!(
            "Converted {} rows into a tree of {} nodes for {}",
            rows.len(),
            tree.len(),
            self.reference
        );
        self.tree = Some(tree);
        Ok(())
    }

    /// Attach the children from a `subtaxa/` response to the loaded tree.
    ///
    /// Without a tree yet the rows are converted as a whole.
    pub fn attach_children(&mut self, rows: &[ApiRow]) -> Result<()> {
        match self.tree.as_mut() {
            Some(tree) => tree.attach_children(rows),
            None => self.convert_from_api(rows),
        }
    }

    /// Node one level above the selection
    pub fn parent(&self) -> Option<&TaxonNode> {
        let tree = self.tree.as_ref()?;
        tree.parent_of(tree.selected_id())
    }

    /// The selection's own node on the active chain; its children are the menu
    pub fn child(&self) -> Option<&TaxonNode> {
        self.tree.as_ref().map(|tree| tree.selected())
    }

    /// WHERE clause selecting every occurrence record under this taxon.
    ///
    /// Matches each rank column along the active chain; before the tree is
    /// loaded only the taxon's own rank column is used. The root has no
    /// column and selects everything.
    pub fn sql_where(&self, columns: &RankColumns) -> String {
        let conditions: Vec<String> = match &self.tree {
            Some(tree) => tree
                .active_chain()
                .into_iter()
                .filter_map(|node| rank_condition(columns, node.level, &node.id))
                .collect(),
            None => rank_condition(columns, self.reference.level, &self.reference.id)
                .into_iter()
                .collect(),
        };

        if conditions.is_empty() {
            " WHERE true".to_string()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

fn rank_condition(columns: &RankColumns, level: u32, id: &str) -> Option<String> {
    columns
        .column(level)
        .map(|column| format!("{}={}", quote_ident(column), quote_literal(id)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s,
    })
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<NumberOrText>::deserialize(deserializer)?.map(|value| match value {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s,
        }),
    )
}

fn parse_level<E: serde::de::Error>(value: NumberOrText) -> std::result::Result<u32, E> {
    match value {
        NumberOrText::Number(n) => u32::try_from(n).map_err(E::custom),
        NumberOrText::Text(s) => s.trim().parse().map_err(E::custom),
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    parse_level(NumberOrText::deserialize(deserializer)?)
}

fn deserialize_opt_level<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(parse_level::<D::Error>)
        .transpose()
}
