//! Ordered GPS extraction strategies.

use super::{Fields, MetadataTree};
use crate::models::Coordinate;

/// Sub-structure holding the EXIF GPS directory
const GPS_NAMESPACE: &str = "gps";

/// Decimal fallbacks outside the standard locations: (namespace, lat key, lon key)
const ALTERNATE_LOCATIONS: &[(&str, &str, &str)] = &[
    ("drone-dji", "GpsLatitude", "GpsLongitude"),
    ("Camera", "GPSLatitude", "GPSLongitude"),
];

/// One way GPS can be encoded in a [`MetadataTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsStrategy {
    /// Pre-resolved `latitude` / `longitude` decimals at the top level
    DecimalPair,
    /// `GPSLatitude` / `GPSLongitude` component arrays with hemisphere refs at the top level
    RootDms,
    /// The same component arrays inside the `gps` sub-structure
    NamespacedDms,
    /// Decimal fields in vendor namespaces
    AlternateDecimal,
}

impl GpsStrategy {
    /// Extraction order; the first strategy yielding a valid coordinate wins.
    pub const ALL: [GpsStrategy; 4] = [
        GpsStrategy::DecimalPair,
        GpsStrategy::RootDms,
        GpsStrategy::NamespacedDms,
        GpsStrategy::AlternateDecimal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GpsStrategy::DecimalPair => "decimal_pair",
            GpsStrategy::RootDms => "root_dms",
            GpsStrategy::NamespacedDms => "namespaced_dms",
            GpsStrategy::AlternateDecimal => "alternate_decimal",
        }
    }

    /// Candidate coordinate for this strategy, already validated.
    pub fn extract(&self, tree: &MetadataTree) -> Option<Coordinate> {
        match self {
            GpsStrategy::DecimalPair => decimal_pair(&tree.root, "latitude", "longitude"),
            GpsStrategy::RootDms => dms_pair(&tree.root),
            GpsStrategy::NamespacedDms => dms_pair(tree.namespace(GPS_NAMESPACE)?),
            GpsStrategy::AlternateDecimal => ALTERNATE_LOCATIONS.iter().find_map(|(ns, lat, lon)| {
                decimal_pair(tree.namespace(ns)?, lat, lon)
            }),
        }
    }
}

fn decimal_pair(fields: &Fields, lat_key: &str, lon_key: &str) -> Option<Coordinate> {
    let lat = fields.get(lat_key)?.as_number()?;
    let lon = fields.get(lon_key)?.as_number()?;
    Coordinate::new(lat, lon)
}

fn dms_pair(fields: &Fields) -> Option<Coordinate> {
    let lat = dms_field(fields, "GPSLatitude", "GPSLatitudeRef")?;
    let lon = dms_field(fields, "GPSLongitude", "GPSLongitudeRef")?;
    Coordinate::new(lat, lon)
}

fn dms_field(fields: &Fields, key: &str, ref_key: &str) -> Option<f64> {
    let components = fields.get(key)?.as_components()?;
    let hemisphere = fields.get(ref_key).and_then(|v| v.as_text());
    dms_to_decimal(&components, hemisphere)
}

/// `degrees + minutes/60 + seconds/3600`, negated for an `S` or `W`
/// hemisphere. Missing minutes or seconds count as zero; a missing
/// hemisphere reference leaves the value positive.
pub fn dms_to_decimal(components: &[f64], hemisphere: Option<&str>) -> Option<f64> {
    let degrees = *components.first()?;
    let minutes = components.get(1).copied().unwrap_or(0.0);
    let seconds = components.get(2).copied().unwrap_or(0.0);

    let value = degrees + minutes / 60.0 + seconds / 3600.0;

    let negate = hemisphere
        .and_then(|h| h.trim().chars().next())
        .map(|c| matches!(c.to_ascii_uppercase(), 'S' | 'W'))
        .unwrap_or(false);

    Some(if negate { -value } else { value })
}
