pub mod taxon;
pub mod taxonomy;

pub use taxon::{ApiRow, NodeId, Taxon, TaxonNode, TaxonRef, TaxonTree};
pub use taxonomy::{RankColumns, TaxonomicRank};
