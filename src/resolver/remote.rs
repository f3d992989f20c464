//! Reverse-geocoding fallback with fuzzy catalog matching.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::catalog::SubdivisionCatalog;
use crate::geocoder::ReverseGeocoder;
use crate::models::{Coordinate, SubdivisionRecord};

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn fold_whitespace(text: &str) -> String {
    whitespace_regex().replace_all(text, "").into_owned()
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Match free text against catalog names. Stages, each over the whole
/// catalog in order: case-insensitive equality, case-insensitive substring
/// in either direction, then the same substring test with all whitespace
/// removed. Blank text never matches.
pub fn match_subdivision<'a>(
    catalog: &'a SubdivisionCatalog,
    text: &str,
) -> Option<&'a SubdivisionRecord> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(record) = catalog.iter().find(|r| r.name.to_lowercase() == needle) {
        return Some(record);
    }

    if let Some(record) = catalog
        .iter()
        .find(|r| overlaps(&r.name.to_lowercase(), &needle))
    {
        return Some(record);
    }

    let folded = fold_whitespace(&needle);
    if folded.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|r| overlaps(&fold_whitespace(&r.name.to_lowercase()), &folded))
}

/// A catalog entry found through the reverse geocoder
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMatch {
    pub record: SubdivisionRecord,
    /// Subdivision text as returned by the geocoder
    pub matched_text: String,
    pub municipality: Option<String>,
}

/// Best-effort enrichment: geocoder failures are logged and become `None`.
pub struct RemoteResolver<G> {
    geocoder: G,
    catalog: Arc<SubdivisionCatalog>,
}

impl<G: ReverseGeocoder> RemoteResolver<G> {
    pub fn new(geocoder: G, catalog: Arc<SubdivisionCatalog>) -> Self {
        Self { geocoder, catalog }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> Option<RemoteMatch> {
        let address = match self.geocoder.reverse(coordinate).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding {} failed: {}", coordinate, e);
                return None;
            }
        };

        let Some(text) = address.subdivision else {
            debug!("Reverse geocoder returned no subdivision for {}", coordinate);
            return None;
        };

        match match_subdivision(&self.catalog, &text) {
            Some(record) => {
                debug!("Geocoder subdivision '{}' matched {}", text, record.name);
                Some(RemoteMatch {
                    record: record.clone(),
                    matched_text: text,
                    municipality: address.municipality,
                })
            }
            None => {
                debug!("Geocoder subdivision '{}' not in catalog", text);
                None
            }
        }
    }
}
