use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::TaxonSource;
use crate::bio::taxon::{ApiRow, TaxonRef};
use crate::core::config::ApiConfig;
use crate::core::query::search_query;
use crate::{Result, TaxomapError};

/// Taxon REST API over HTTP
pub struct HttpTaxonSource {
    client: Client,
    base_url: Url,
}

impl HttpTaxonSource {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TaxomapError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TaxomapError::Parse(format!("invalid API path {}: {}", path, e)))
    }

    /// GET `path` and decode a JSON array; `null` or an empty body count as no rows
    async fn get_rows<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = self.resolve(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TaxomapError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaxomapError::Transport(status_text(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TaxomapError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Option<Vec<T>> = serde_json::from_str(&body)?;
        let rows = rows.unwrap_or_default();
        debug!("{} answered {} rows", url, rows.len());
        Ok(rows)
    }

    /// Save the body of an absolute URL (e.g. a download link) to `output`
    pub async fn download_to(&self, url: &str, output: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, output.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TaxomapError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TaxomapError::Transport(status_text(status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TaxomapError::Transport(e.to_string()))?;
        tokio::fs::write(output, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[async_trait]
impl TaxonSource for HttpTaxonSource {
    async fn fetch(&self, path: &str) -> Result<Vec<ApiRow>> {
        self.get_rows(path).await
    }

    async fn search(&self, term: &str) -> Result<Vec<TaxonRef>> {
        self.get_rows(&search_query(term)).await
    }
}

/// Parse the API base URL, making sure relative joins keep its last segment
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| TaxomapError::Config(format!("invalid api.base_url {}: {}", base_url, e)))
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let source = HttpTaxonSource::new(&ApiConfig {
            base_url: "https://example.org/api".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(source.base_url().as_str(), "https://example.org/api/");
        assert_eq!(
            source.resolve("taxon/Aves/3/").unwrap().as_str(),
            "https://example.org/api/taxon/Aves/3/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTaxonSource::new(&ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, TaxomapError::Config(_)));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(StatusCode::NOT_FOUND), "404 Not Found");
        assert_eq!(status_text(StatusCode::BAD_GATEWAY), "502 Bad Gateway");
    }
}
