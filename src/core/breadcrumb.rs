/// Ancestry trail from the hierarchy root down to the selected taxon
use serde::Serialize;

use crate::bio::taxon::TaxonTree;

/// Default label of the synthetic root crumb
pub const DEFAULT_ROOT_NAME: &str = "Eukaryota";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AncestryEntry {
    pub name: String,
    pub id: String,
}

/// Walk the active chain from the root, collecting every expanded node.
///
/// Stops at the first node without a `children` field; that unexpanded leaf
/// is not part of the ancestry. The tree is only read.
pub fn flatten(tree: &TaxonTree) -> Vec<AncestryEntry> {
    let mut ancestry = Vec::new();
    let mut current = tree.root_id();

    loop {
        let node = tree.node(current);
        let Some(children) = node.children() else {
            break;
        };
        ancestry.push(AncestryEntry {
            name: node.name.clone(),
            id: node.id.clone(),
        });
        match children.first() {
            Some(next) => current = *next,
            None => break,
        }
    }

    ancestry
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    pub id: String,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    crumbs: Vec<Crumb>,
}

impl Breadcrumb {
    /// Trail holding only the synthetic root
    pub fn root_only(root_name: &str) -> Self {
        Self {
            crumbs: vec![Crumb {
                name: root_name.to_string(),
                id: root_name.to_string(),
                level: 0,
            }],
        }
    }

    /// Synthetic root followed by the flattened ancestry.
    ///
    /// The tree's own level-0 node is represented by the synthetic crumb, so
    /// each remaining crumb's level equals its index in the trail. A chain
    /// starting below level 1 leaves a gap after the root: crumbs keep their
    /// node levels so that selecting one still requests the right rank.
    pub fn from_tree(tree: &TaxonTree, root_name: &str) -> Self {
        let mut breadcrumb = Self::root_only(root_name);
        let base_level = tree.root().level;

        for (index, entry) in flatten(tree).into_iter().enumerate() {
            let level = base_level + index as u32;
            if level == 0 {
                continue;
            }
            breadcrumb.crumbs.push(Crumb {
                name: entry.name,
                id: entry.id,
                level,
            });
        }

        breadcrumb
    }

    pub fn crumbs(&self) -> &[Crumb] {
        &self.crumbs
    }

    pub fn names(&self) -> Vec<&str> {
        self.crumbs.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn last(&self) -> Option<&Crumb> {
        self.crumbs.last()
    }

    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crumbs.is_empty()
    }

    /// Crumbs to show when at most `max_visible` fit, and whether the
    /// ellipsis between the root and the tail is needed
    pub fn display_window(&self, max_visible: usize) -> (Vec<&Crumb>, bool) {
        let max_visible = max_visible.max(1);
        if self.crumbs.len() <= max_visible {
            return (self.crumbs.iter().collect(), false);
        }

        let tail_start = self.crumbs.len() - (max_visible - 1);
        let mut visible = vec![&self.crumbs[0]];
        visible.extend(self.crumbs[tail_start..].iter());
        (visible, true)
    }
}

impl std::fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names().join(" › "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::taxon::{ApiRow, TaxonRef};
    use pretty_assertions::assert_eq;

    fn three_level_tree() -> TaxonTree {
        let rows = vec![
            ApiRow::new("Eukaryota", "Eukaryota"),
            ApiRow::new("Animalia", "Animalia"),
            ApiRow::new("Chordata", "Chordata").with_children(vec![
                ApiRow::new("Aves", "Aves"),
                ApiRow::new("Mammalia", "Mammalia"),
            ]),
        ];
        TaxonTree::from_api(&TaxonRef::new("Chordata", 2), &rows).unwrap()
    }

    #[test]
    fn test_flatten_root_to_leaf() {
        let ancestry = flatten(&three_level_tree());
        let ids: Vec<&str> = ancestry.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["Eukaryota", "Animalia", "Chordata"]);
    }

    #[test]
    fn test_flatten_is_pure() {
        let tree = three_level_tree();
        let before = tree.clone();
        assert_eq!(flatten(&tree), flatten(&tree));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_flatten_stops_at_unexpanded_selection() {
        let rows = vec![
            ApiRow::new("Eukaryota", "Eukaryota"),
            ApiRow::new("Animalia", "Animalia"),
        ];
        let tree = TaxonTree::from_api(&TaxonRef::new("Animalia", 1), &rows).unwrap();
        let ancestry = flatten(&tree);
        assert_eq!(ancestry.len(), 1);
        assert_eq!(ancestry[0].id, "Eukaryota");
    }

    #[test]
    fn test_flatten_includes_childless_selection() {
        let rows = vec![
            ApiRow::new("Eukaryota", "Eukaryota"),
            ApiRow::new("Fungi", "Fungi").with_children(vec![]),
        ];
        let tree = TaxonTree::from_api(&TaxonRef::new("Fungi", 1), &rows).unwrap();
        assert_eq!(flatten(&tree).len(), 2);
    }

    #[test]
    fn test_breadcrumb_levels_match_index() {
        let breadcrumb = Breadcrumb::from_tree(&three_level_tree(), DEFAULT_ROOT_NAME);
        assert_eq!(breadcrumb.names(), vec!["Eukaryota", "Animalia", "Chordata"]);
        for (index, crumb) in breadcrumb.crumbs().iter().enumerate() {
            assert_eq!(crumb.level as usize, index);
        }
        assert_eq!(breadcrumb.to_string(), "Eukaryota › Animalia › Chordata");
    }

    #[test]
    fn test_breadcrumb_from_partial_chain() {
        let rows = vec![
            ApiRow::new("Animalia", "Animalia"),
            ApiRow::new("Chordata", "Chordata").with_children(vec![]),
        ];
        let tree = TaxonTree::from_api(&TaxonRef::new("Chordata", 2), &rows).unwrap();
        let breadcrumb = Breadcrumb::from_tree(&tree, "Life");
        assert_eq!(breadcrumb.names(), vec!["Life", "Animalia", "Chordata"]);
        assert_eq!(breadcrumb.last().unwrap().level, 2);
        for (index, crumb) in breadcrumb.crumbs().iter().enumerate() {
            assert_eq!(crumb.level as usize, index);
        }
    }

    #[test]
    fn test_breadcrumb_keeps_node_levels_across_a_gap() {
        let rows = vec![
            ApiRow::new("Chordata", "Chordata").with_level(2),
            ApiRow::new("Aves", "Aves").with_children(vec![]),
        ];
        let tree = TaxonTree::from_api(&TaxonRef::new("Aves", 3), &rows).unwrap();
        let breadcrumb = Breadcrumb::from_tree(&tree, "Life");

        let crumbs: Vec<(&str, u32)> = breadcrumb
            .crumbs()
            .iter()
            .map(|c| (c.id.as_str(), c.level))
            .collect();
        assert_eq!(crumbs, vec![("Life", 0), ("Chordata", 2), ("Aves", 3)]);
    }

    #[test]
    fn test_display_window() {
        let breadcrumb = Breadcrumb::from_tree(&three_level_tree(), DEFAULT_ROOT_NAME);

        let (visible, ellipsis) = breadcrumb.display_window(5);
        assert_eq!(visible.len(), 3);
        assert!(!ellipsis);

        let (visible, ellipsis) = breadcrumb.display_window(2);
        let names: Vec<&str> = visible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Eukaryota", "Chordata"]);
        assert!(ellipsis);
    }
}
