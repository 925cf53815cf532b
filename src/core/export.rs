/// Occurrence downloads through the map provider's SQL API
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::form_urlencoded;

use crate::bio::taxon::Taxon;
use crate::bio::taxonomy::RankColumns;
use crate::core::filters::{serialize_for_sql, ActiveFilterSet, DOWNLOAD_KINDS};
use crate::TaxomapError;

/// File name (without extension) suggested to the SQL API
pub const DOWNLOAD_FILENAME: &str = "taxomap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Csv,
    Kml,
    ShapeZip,
    GeoJson,
}

impl DownloadFormat {
    pub const ALL: [DownloadFormat; 4] = [Self::Csv, Self::Kml, Self::ShapeZip, Self::GeoJson];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "Spreadsheet (CSV)",
            Self::Kml => "Google Earth (KML)",
            Self::ShapeZip => "GIS software (SHP)",
            Self::GeoJson => "Geometry (GeoJSON)",
        }
    }

    /// Value of the SQL API `format` parameter
    pub fn api_format(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Kml => "kml",
            Self::ShapeZip => "shp",
            Self::GeoJson => "geojson",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Kml => "kml",
            Self::ShapeZip => "zip",
            Self::GeoJson => "geojson",
        }
    }
}

impl FromStr for DownloadFormat {
    type Err = TaxomapError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "kml" => Ok(Self::Kml),
            "shp" | "shape-zip" | "shapefile" => Ok(Self::ShapeZip),
            "geojson" | "json" | "application/json" => Ok(Self::GeoJson),
            _ => Err(TaxomapError::Parse(format!("unknown download format: {}", s))),
        }
    }
}

impl std::fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// SQL selecting every record under `taxon`, with all filter kinds applied
pub fn download_sql(table: &str, taxon: &Taxon, columns: &RankColumns, filters: &ActiveFilterSet) -> String {
    let mut sql = format!("SELECT * FROM {}{}", table, taxon.sql_where(columns));
    let filter_sql = serialize_for_sql(filters, DOWNLOAD_KINDS);
    if !filter_sql.is_empty() {
        sql.push(' ');
        sql.push_str(&filter_sql);
    }
    sql
}

pub fn download_url(
    sql_api: &str,
    table: &str,
    taxon: &Taxon,
    columns: &RankColumns,
    filters: &ActiveFilterSet,
    format: DownloadFormat,
) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", &download_sql(table, taxon, columns, filters))
        .append_pair("format", format.api_format())
        .append_pair("filename", DOWNLOAD_FILENAME)
        .finish();

    let separator = if sql_api.ends_with('?') || sql_api.ends_with('&') {
        ""
    } else if sql_api.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{}{}{}", sql_api, separator, query)
}
