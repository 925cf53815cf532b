/// Drill-down menu model: go-up affordance, active title, navigable children
use serde::Serialize;

use crate::bio::taxon::{Taxon, TaxonRef};

/// Label of the parent-navigation entry
pub const PARENT_LABEL: &str = "↩";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub count: Option<u64>,
}

impl MenuItem {
    pub fn label(&self) -> String {
        match self.count {
            Some(count) => format!("{} ({})", self.name, count),
            None => self.name.clone(),
        }
    }

    pub fn to_ref(&self) -> TaxonRef {
        TaxonRef::new(self.id.clone(), self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub parent: Option<MenuItem>,
    pub title: String,
    pub items: Vec<MenuItem>,
    pub message: Option<String>,
}

impl Menu {
    pub fn from_taxon(taxon: &Taxon) -> Self {
        let items = match (taxon.tree(), taxon.child()) {
            (Some(tree), Some(_)) => tree
                .children_of(tree.selected_id())
                .map(|node| MenuItem {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    level: node.level,
                    count: node.count,
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            parent: parent_item(taxon),
            title: title(taxon),
            items,
            message: None,
        }
    }

    /// Menu reduced to the go-up entry and a message
    pub fn with_message(taxon: &Taxon, message: impl Into<String>) -> Self {
        Self {
            parent: parent_item(taxon),
            title: title(taxon),
            items: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn parent_item(taxon: &Taxon) -> Option<MenuItem> {
    if taxon.level() == 0 {
        return None;
    }
    taxon.parent().map(|parent| MenuItem {
        id: parent.id.clone(),
        name: PARENT_LABEL.to_string(),
        level: taxon.level() - 1,
        count: None,
    })
}

fn title(taxon: &Taxon) -> String {
    taxon
        .child()
        .map(|child| child.name.clone())
        .unwrap_or_else(|| taxon.id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::taxon::ApiRow;
    use pretty_assertions::assert_eq;

    fn loaded(id: &str, level: u32, rows: Vec<ApiRow>) -> Taxon {
        let mut taxon = Taxon::new(id, level);
        taxon.convert_from_api(&rows).unwrap();
        taxon
    }

    #[test]
    fn test_menu_lists_navigable_children() {
        let taxon = loaded(
            "Animalia",
            1,
            vec![
                ApiRow::new("Eukaryota", "Eukaryota"),
                ApiRow::new("Animalia", "Animalia").with_children(vec![
                    ApiRow::new("Chordata", "Chordata").with_count(5400),
                    ApiRow::new("Mollusca", "Mollusca"),
                    ApiRow {
                        name: Some("Incertae sedis".to_string()),
                        count: Some(12),
                        ..Default::default()
                    },
                ]),
            ],
        );

        let menu = Menu::from_taxon(&taxon);
        assert_eq!(menu.title, "Animalia");
        assert_eq!(
            menu.parent,
            Some(MenuItem {
                id: "Eukaryota".to_string(),
                name: PARENT_LABEL.to_string(),
                level: 0,
                count: None,
            })
        );
        let labels: Vec<String> = menu.items.iter().map(MenuItem::label).collect();
        assert_eq!(labels, vec!["Chordata (5400)", "Mollusca"]);
        assert!(menu.items.iter().all(|item| item.level == 2));
        assert_eq!(menu.items[0].to_ref(), TaxonRef::new("Chordata", 2));
    }

    #[test]
    fn test_root_has_no_parent_entry() {
        let taxon = loaded(
            "Eukaryota",
            0,
            vec![ApiRow::new("Eukaryota", "Eukaryota").with_children(vec![ApiRow::new("Fungi", "Fungi")])],
        );
        let menu = Menu::from_taxon(&taxon);
        assert!(menu.parent.is_none());
        assert_eq!(menu.items.len(), 1);
    }

    #[test]
    fn test_unloaded_taxon_falls_back_to_id() {
        let menu = Menu::from_taxon(&Taxon::new("Animalia", 1));
        assert_eq!(menu.title, "Animalia");
        assert!(menu.parent.is_none());
        assert!(menu.is_empty());
    }

    #[test]
    fn test_message_menu_keeps_parent_only() {
        let taxon = loaded(
            "Chordata",
            2,
            vec![
                ApiRow::new("Eukaryota", "Eukaryota"),
                ApiRow::new("Animalia", "Animalia"),
                ApiRow::new("Chordata", "Chordata").with_children(vec![ApiRow::new("Aves", "Aves")]),
            ],
        );
        let menu = Menu::with_message(&taxon, "No results");
        assert_eq!(menu.parent.as_ref().map(|p| p.id.as_str()), Some("Animalia"));
        assert!(menu.items.is_empty());
        assert_eq!(menu.message.as_deref(), Some("No results"));
    }
}
