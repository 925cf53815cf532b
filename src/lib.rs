pub mod api;
pub mod bio;
pub mod cli;
pub mod core;

pub use crate::bio::taxon::{Taxon, TaxonRef, TaxonTree};
pub use crate::core::filters::{ActiveFilterSet, Filter, FilterKind};
pub use crate::core::navigator::{NavState, Navigator};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxomapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A direct taxon fetch came back empty
    #[error("Taxon does not exist")]
    NotFound,

    /// A children fetch came back empty
    #[error("No results")]
    NoChildren,

    #[error("An error occurred: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, TaxomapError>;
