/// Active query refinements and their SQL / REST serializations
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::form_urlencoded;

use crate::{Result, TaxomapError};

/// Geometry column of the occurrence table used by spatial filters
pub const GEOMETRY_COLUMN: &str = "the_geom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Circle,
    FieldValue,
    MinMax,
}

/// Every filter kind; used by menu and download queries
pub const ALL_KINDS: &[FilterKind] = &[FilterKind::Circle, FilterKind::FieldValue, FilterKind::MinMax];

/// Kinds applied to the map layer SQL; the circle is drawn, not queried
pub const MAP_KINDS: &[FilterKind] = &[FilterKind::FieldValue, FilterKind::MinMax];

pub const MENU_KINDS: &[FilterKind] = ALL_KINDS;

pub const DOWNLOAD_KINDS: &[FilterKind] = ALL_KINDS;

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::FieldValue => "fieldvalue",
            Self::MinMax => "minmax",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FilterKind {
    type Err = TaxomapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "circle" => Ok(Self::Circle),
            "fieldvalue" => Ok(Self::FieldValue),
            "minmax" => Ok(Self::MinMax),
            _ => Err(TaxomapError::InvalidFilter(format!("unknown filter kind: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
    /// Records within `radius_meters` of a point
    Circle {
        lat: f64,
        lon: f64,
        radius_meters: f64,
    },
    /// Categorical equality
    FieldValue { field: String, value: String },
    /// Inclusive numeric range
    MinMax { field: String, min: f64, max: f64 },
}

impl Filter {
    pub fn circle(lat: f64, lon: f64, radius_meters: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TaxomapError::InvalidFilter(format!(
                "circle center out of range: {}, {}",
                lat, lon
            )));
        }
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(TaxomapError::InvalidFilter(format!(
                "invalid circle radius: {}",
                radius_meters
            )));
        }
        Ok(Self::Circle {
            lat,
            lon,
            radius_meters,
        })
    }

    pub fn field_value(field: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let field = field.into();
        validate_field(&field)?;
        Ok(Self::FieldValue {
            field,
            value: value.into(),
        })
    }

    pub fn min_max(field: impl Into<String>, min: f64, max: f64) -> Result<Self> {
        let field = field.into();
        validate_field(&field)?;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(TaxomapError::InvalidFilter(format!(
                "invalid range for {}: {}..{}",
                field, min, max
            )));
        }
        Ok(Self::MinMax { field, min, max })
    }

    /// Temporal range over a year column
    pub fn time_range(field: impl Into<String>, from_year: i32, to_year: i32) -> Result<Self> {
        Self::min_max(field, from_year as f64, to_year as f64)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Circle { .. } => FilterKind::Circle,
            Self::FieldValue { .. } => FilterKind::FieldValue,
            Self::MinMax { .. } => FilterKind::MinMax,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Circle { .. } => None,
            Self::FieldValue { field, .. } | Self::MinMax { field, .. } => Some(field),
        }
    }

    pub fn key(&self) -> FilterKey {
        FilterKey {
            kind: self.kind(),
            field: self.field().map(str::to_string),
        }
    }

    /// SQL condition without the leading `AND`
    pub fn sql_condition(&self) -> String {
        match self {
            Self::Circle {
                lat,
                lon,
                radius_meters,
            } => format!(
                "ST_DWithin({}::geography, ST_SetSRID(ST_MakePoint({}, {}), 4326)::geography, {})",
                GEOMETRY_COLUMN, lon, lat, radius_meters
            ),
            Self::FieldValue { field, value } => format!("{}={}", field, quote_literal(value)),
            Self::MinMax { field, min, max } => format!("{} BETWEEN {} AND {}", field, min, max),
        }
    }

    fn append_rest_pairs(&self, query: &mut form_urlencoded::Serializer<'_, String>) {
        match self {
            Self::Circle {
                lat,
                lon,
                radius_meters,
            } => {
                query.append_pair("lat", &lat.to_string());
                query.append_pair("lon", &lon.to_string());
                query.append_pair("radius", &radius_meters.to_string());
            }
            Self::FieldValue { field, value } => {
                query.append_pair(field, value);
            }
            Self::MinMax { field, min, max } => {
                query.append_pair(&format!("{}_min", field), &min.to_string());
                query.append_pair(&format!("{}_max", field), &max.to_string());
            }
        }
    }
}

impl FromStr for Filter {
    type Err = TaxomapError;

    /// Accepts `field=value`, `field=min..max` and `lat,lon,radius`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('=') {
            Some((field, rhs)) => match rhs.split_once("..") {
                Some((min, max)) => Self::min_max(field.trim(), parse_number(min)?, parse_number(max)?),
                None => Self::field_value(field.trim(), rhs.trim()),
            },
            None => {
                let parts: Vec<&str> = s.split(',').collect();
                if parts.len() != 3 {
                    return Err(TaxomapError::InvalidFilter(format!(
                        "expected field=value, field=min..max or lat,lon,radius: {}",
                        s
                    )));
                }
                Self::circle(
                    parse_number(parts[0])?,
                    parse_number(parts[1])?,
                    parse_number(parts[2])?,
                )
            }
        }
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| TaxomapError::InvalidFilter(format!("{}: {}", s.trim(), e)))
}

fn validate_field(field: &str) -> Result<()> {
    let mut chars = field.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TaxomapError::InvalidFilter(format!("invalid field name: {:?}", field)))
    }
}

/// Uniqueness key: one filter per kind and field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub kind: FilterKind,
    pub field: Option<String>,
}

/// Ordered filter set, unique by `(kind, field)`.
///
/// Inserting a filter with an existing key replaces it in place, so the
/// serialization order is always first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct ActiveFilterSet {
    filters: IndexMap<FilterKey, Filter>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or supersede, returning the filter that was replaced
    pub fn insert(&mut self, filter: Filter) -> Option<Filter> {
        self.filters.insert(filter.key(), filter)
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.insert(filter);
        self
    }

    pub fn remove(&mut self, kind: FilterKind, field: Option<&str>) -> Option<Filter> {
        let key = FilterKey {
            kind,
            field: field.map(str::to_string),
        };
        self.filters.shift_remove(&key)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn allowed<'a>(&'a self, allowed_kinds: &'a [FilterKind]) -> impl Iterator<Item = &'a Filter> {
        self.iter().filter(move |f| allowed_kinds.contains(&f.kind()))
    }
}

impl PartialEq for ActiveFilterSet {
    fn eq(&self, other: &Self) -> bool {
        self.filters.iter().eq(other.filters.iter())
    }
}

impl FromIterator<Filter> for ActiveFilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        let mut set = Self::new();
        for filter in iter {
            set.insert(filter);
        }
        set
    }
}

/// `AND`-prefixed SQL fragment, or empty when no allowed filter is active
pub fn serialize_for_sql(filters: &ActiveFilterSet, allowed_kinds: &[FilterKind]) -> String {
    filters
        .allowed(allowed_kinds)
        .map(|f| format!("AND {}", f.sql_condition()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `&`-joined, form-encoded `key=value` pairs, or empty
pub fn serialize_for_rest(filters: &ActiveFilterSet, allowed_kinds: &[FilterKind]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for filter in filters.allowed(allowed_kinds) {
        filter.append_rest_pairs(&mut query);
    }
    query.finish()
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
