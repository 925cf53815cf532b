//! Common test utilities for Taxomap tests
//!
//! An in-memory [`TaxonSource`] answering from a fixed path table, plus a
//! small Animalia > Chordata fixture.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use taxomap::api::TaxonSource;
use taxomap::bio::{ApiRow, TaxonRef};
use taxomap::{Result, TaxomapError};

#[derive(Default)]
pub struct MockSource {
    rows: HashMap<String, Vec<ApiRow>>,
    failures: HashMap<String, String>,
    searches: HashMap<String, Vec<TaxonRef>>,
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, path: &str, rows: Vec<ApiRow>) -> Self {
        self.rows.insert(path.to_string(), rows);
        self
    }

    pub fn with_failure(mut self, path: &str, message: &str) -> Self {
        self.failures.insert(path.to_string(), message.to_string());
        self
    }

    pub fn with_search(mut self, term: &str, matches: Vec<TaxonRef>) -> Self {
        self.searches.insert(term.to_string(), matches);
        self
    }

    /// Paths fetched so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaxonSource for MockSource {
    async fn fetch(&self, path: &str) -> Result<Vec<ApiRow>> {
        self.requests.lock().unwrap().push(path.to_string());
        if let Some(message) = self.failures.get(path) {
            return Err(TaxomapError::Transport(message.clone()));
        }
        Ok(self.rows.get(path).cloned().unwrap_or_default())
    }

    async fn search(&self, term: &str) -> Result<Vec<TaxonRef>> {
        Ok(self.searches.get(term).cloned().unwrap_or_default())
    }
}

pub fn eukaryota() -> ApiRow {
    ApiRow::new("Eukaryota", "Eukaryota")
}

pub fn animalia() -> ApiRow {
    ApiRow::new("Animalia", "Animalia")
}

pub fn chordata() -> ApiRow {
    ApiRow::new("Chordata", "Chordata")
}

/// Animalia at level 1 with Chordata and Mollusca below it, Chordata with
/// Aves and Mammalia, and a childless Placozoa. Children responses hold only
/// the node itself, as the API returns them.
pub fn animalia_source() -> MockSource {
    let unnamed = ApiRow {
        name: Some("Incertae sedis".to_string()),
        count: Some(2),
        ..Default::default()
    };

    MockSource::new()
        .with_rows("taxon/Animalia/1/", vec![eukaryota(), animalia()])
        .with_rows(
            "subtaxa/Animalia/1/?",
            vec![animalia().with_children(vec![
                chordata().with_count(120),
                ApiRow::new("Mollusca", "Mollusca").with_count(45),
                ApiRow::new("Placozoa", "Placozoa").with_count(1),
                unnamed,
            ])],
        )
        .with_rows("taxon/Chordata/2/", vec![eukaryota(), animalia(), chordata()])
        .with_rows(
            "subtaxa/Chordata/2/?",
            vec![chordata().with_children(vec![
                ApiRow::new("Aves", "Aves").with_count(80),
                ApiRow::new("Mammalia", "Mammalia").with_count(40),
            ])],
        )
        .with_rows(
            "subtaxa/Chordata/2/?kingdom=Animalia",
            vec![chordata().with_children(vec![ApiRow::new("Aves", "Aves").with_count(80)])],
        )
        .with_rows(
            "taxon/Placozoa/2/",
            vec![eukaryota(), animalia(), ApiRow::new("Placozoa", "Placozoa")],
        )
}
