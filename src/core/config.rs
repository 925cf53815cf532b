use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::bio::taxonomy::RankColumns;
use crate::core::breadcrumb::DEFAULT_ROOT_NAME;
use crate::core::paths;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub map: MapConfig,
    pub taxonomy: TaxonomyConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the taxon REST API, joined with `taxon/`, `subtaxa/`, `search/`
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Occurrence table queried by the map layer and downloads
    pub table: String,
    /// SQL API endpoint used for downloads
    pub sql_api: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Label of the synthetic level-0 breadcrumb
    pub root_name: String,
    /// Occurrence-table column for each level, starting at level 1
    pub rank_columns: RankColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub taxon_id: String,
    pub level: u32,
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("Taxomap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            table: "mcnb_prod".to_string(),
            sql_api: "http://mcnb.cartodb.com/api/v2/sql?".to_string(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            rank_columns: RankColumns::default(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            taxon_id: "Animalia".to_string(),
            level: 1,
            lat: 41.0,
            lon: 5.0,
            zoom: 6,
        }
    }
}

impl Config {
    /// Load the configuration file if one exists, defaults otherwise
    pub fn load_or_default() -> Result<Self, crate::TaxomapError> {
        let path = paths::config_path();
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            load_config(&path)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), crate::TaxomapError> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::TaxomapError::Config("api.base_url is empty".to_string()));
        }
        if self.map.table.trim().is_empty() {
            return Err(crate::TaxomapError::Config("map.table is empty".to_string()));
        }
        if self.taxonomy.rank_columns.is_empty() {
            return Err(crate::TaxomapError::Config(
                "taxonomy.rank_columns must name at least one column".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::TaxomapError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::TaxomapError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::TaxomapError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::TaxomapError::Config(format!("Failed to serialize config: {}", e)))?;
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
