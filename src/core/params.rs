/// Start-up parameters: requested taxon, optional search term and map view
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::api::TaxonSource;
use crate::bio::taxon::TaxonRef;
use crate::core::config::DefaultsConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PageParams {
    pub taxon: TaxonRef,
    /// Free-text taxon name to look up instead of `taxon`
    pub taxon_search: Option<String>,
    /// Place name; kept for callers that geocode it
    pub placename: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl PageParams {
    pub fn defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            taxon: TaxonRef::new(defaults.taxon_id.clone(), defaults.level),
            taxon_search: None,
            placename: None,
            lat: defaults.lat,
            lon: defaults.lon,
            zoom: defaults.zoom,
        }
    }

    /// Parse a `key=value&...` query string on top of the defaults.
    ///
    /// A `level` that is not a non-zero integer keeps the default level;
    /// other unparseable values keep their defaults too.
    pub fn parse(query: &str, defaults: &DefaultsConfig) -> Self {
        let mut params = Self::defaults(defaults);
        let query = query.trim_start_matches('?');

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "id" if !value.is_empty() => params.taxon.id = value.to_string(),
                "level" => {
                    if let Some(level) = value.parse::<u32>().ok().filter(|l| *l > 0) {
                        params.taxon.level = level;
                    }
                }
                "taxon" if !value.is_empty() => params.taxon_search = Some(value.to_string()),
                "placename" if !value.is_empty() => params.placename = Some(value.to_string()),
                "lat" => params.lat = value.parse().unwrap_or(params.lat),
                "lon" => params.lon = value.parse().unwrap_or(params.lon),
                "zoom" => params.zoom = value.parse().unwrap_or(params.zoom),
                other => debug!("Ignoring page parameter {}", other),
            }
        }

        params
    }

    /// Taxon to load first: the best search match if a term was given,
    /// otherwise the requested taxon.
    pub async fn resolve_initial<S: TaxonSource + ?Sized>(&self, source: &S) -> TaxonRef {
        let Some(term) = &self.taxon_search else {
            return self.taxon.clone();
        };

        match source.search(term).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(found) => {
                    debug!("Search for {} resolved to {}", term, found);
                    found
                }
                None => {
                    warn!("Couldn't find a taxon named {}", term);
                    self.taxon.clone()
                }
            },
            Err(e) => {
                warn!("Couldn't find a taxon named {}: {}", term, e);
                self.taxon.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let params = PageParams::parse("", &DefaultsConfig::default());
        assert_eq!(params.taxon, TaxonRef::new("Animalia", 1));
        assert_eq!(params.zoom, 6);
        assert_eq!((params.lat, params.lon), (41.0, 5.0));
        assert!(params.taxon_search.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let params = PageParams::parse(
            "?id=Chordata&level=2&taxon=Homo%20sapiens&placename=Barcelona&zoom=9&lat=41.38&lon=2.17",
            &DefaultsConfig::default(),
        );
        assert_eq!(params.taxon, TaxonRef::new("Chordata", 2));
        assert_eq!(params.taxon_search.as_deref(), Some("Homo sapiens"));
        assert_eq!(params.placename.as_deref(), Some("Barcelona"));
        assert_eq!(params.zoom, 9);
        assert_eq!((params.lat, params.lon), (41.38, 2.17));
    }

    #[test]
    fn test_zero_or_garbage_level_falls_back() {
        let defaults = DefaultsConfig::default();
        assert_eq!(PageParams::parse("level=0", &defaults).taxon.level, 1);
        assert_eq!(PageParams::parse("level=abc", &defaults).taxon.level, 1);
        assert_eq!(PageParams::parse("level=-3", &defaults).taxon.level, 1);
        assert_eq!(PageParams::parse("zoom=far", &defaults).zoom, 6);
    }
}
