/// Taxonomic ranks and their mapping onto occurrence-table columns
use serde::{Deserialize, Serialize};

/// Ranks from the synthetic root down to species.
///
/// The discriminant order matches the navigation level: the root (`Domain`)
/// sits at level 0 and each step down the hierarchy adds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxonomicRank {
    Domain,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl TaxonomicRank {
    pub const ALL: [TaxonomicRank; 8] = [
        Self::Domain,
        Self::Kingdom,
        Self::Phylum,
        Self::Class,
        Self::Order,
        Self::Family,
        Self::Genus,
        Self::Species,
    ];

    /// Parse rank from its lowercase name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "domain" | "superkingdom" => Some(Self::Domain),
            "kingdom" => Some(Self::Kingdom),
            "phylum" | "division" => Some(Self::Phylum),
            "class" => Some(Self::Class),
            "order" => Some(Self::Order),
            "family" => Some(Self::Family),
            "genus" => Some(Self::Genus),
            "species" => Some(Self::Species),
            _ => None,
        }
    }

    /// Rank for a navigation level, `None` past species
    pub fn from_level(level: u32) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    /// Navigation level (root = 0)
    pub fn level(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
        }
    }
}

impl std::fmt::Display for TaxonomicRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Column names of the occurrence table, one per level starting at level 1.
///
/// The root level has no column: selecting it means "every record".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankColumns(Vec<String>);

impl Default for RankColumns {
    fn default() -> Self {
        Self(
            ["kingdom", "phylum", "class", "order", "family", "genus", "scientificname"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        )
    }
}

impl RankColumns {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    /// Column holding the taxon name for `level`
    pub fn column(&self, level: u32) -> Option<&str> {
        if level == 0 {
            return None;
        }
        self.0.get(level as usize - 1).map(|c| c.as_str())
    }

    /// Deepest level that still has a column
    pub fn max_level(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_levels_follow_hierarchy() {
        assert_eq!(TaxonomicRank::Domain.level(), 0);
        assert_eq!(TaxonomicRank::Kingdom.level(), 1);
        assert_eq!(TaxonomicRank::Species.level(), 7);
        assert_eq!(TaxonomicRank::from_level(2), Some(TaxonomicRank::Phylum));
        assert_eq!(TaxonomicRank::from_level(8), None);
    }

    #[test]
    fn test_rank_from_name() {
        assert_eq!(TaxonomicRank::from_name("Order"), Some(TaxonomicRank::Order));
        assert_eq!(TaxonomicRank::from_name("superkingdom"), Some(TaxonomicRank::Domain));
        assert_eq!(TaxonomicRank::from_name("clade"), None);
    }

    #[test]
    fn test_default_columns() {
        let columns = RankColumns::default();
        assert_eq!(columns.column(0), None);
        assert_eq!(columns.column(1), Some("kingdom"));
        assert_eq!(columns.column(7), Some("scientificname"));
        assert_eq!(columns.column(8), None);
        assert_eq!(columns.max_level(), 7);
    }
}
