/// External taxon data source
///
/// The navigator only talks to the data API through [`TaxonSource`], so the
/// HTTP client can be swapped for an in-memory source in tests.
pub mod client;

use async_trait::async_trait;

use crate::bio::taxon::{ApiRow, TaxonRef};
use crate::Result;

pub use client::HttpTaxonSource;

#[async_trait]
pub trait TaxonSource: Send + Sync {
    /// Fetch a relative taxon path (`taxon/...` or `subtaxa/...`).
    ///
    /// An empty vector means the API found nothing; transport and decoding
    /// problems are errors.
    async fn fetch(&self, path: &str) -> Result<Vec<ApiRow>>;

    /// Free-text taxon search, best match first
    async fn search(&self, term: &str) -> Result<Vec<TaxonRef>>;
}
