//! Catalog entry for a barangay.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A named subdivision (barangay) with its reference center and the radius
/// inside which a coordinate is considered a confident match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdivisionRecord {
    /// Unique within a catalog
    pub name: String,

    /// Municipality containing the subdivision
    pub parent_region: String,

    pub center: Coordinate,

    pub containment_radius_km: f64,
}

impl SubdivisionRecord {
    pub fn new(name: &str, parent_region: &str, center: Coordinate, radius_km: f64) -> Self {
        Self {
            name: name.to_string(),
            parent_region: parent_region.to_string(),
            center,
            containment_radius_km: radius_km,
        }
    }

    /// Distance from this subdivision's center, in kilometres
    pub fn distance_km(&self, coordinate: &Coordinate) -> f64 {
        self.center.distance_km(coordinate)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.distance_km(coordinate) <= self.containment_radius_km
    }
}
