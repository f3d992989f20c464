//! Validated geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used for all distance computations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Decimal places kept after normalization (~0.11 m).
const PRECISION: f64 = 1_000_000.0;

/// CENRO Manolo Fortich office; the default pending location for reports
/// without any coordinate evidence.
pub const CENRO_OFFICE: Coordinate = Coordinate {
    latitude: 8.372,
    longitude: 124.8645,
};

/// A validated WGS84 coordinate.
///
/// Both components are finite, inside the global ranges, not the (0, 0)
/// "no fix" sentinel, and rounded to 6 decimal places. The only way to get
/// one is through [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and normalize a candidate pair. Returns `None` for NaN or
    /// infinite values, out-of-range values, and exactly (0, 0).
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }

        Some(Self {
            latitude: round6(latitude),
            longitude: round6(longitude),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in kilometres (Haversine).
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self.to_point(), other.to_point())
    }

    /// `geo` point, x = longitude, y = latitude.
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

// Deserialization goes through the validator so a Coordinate read from
// configuration or a request obeys the same invariants.
impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid coordinate ({}, {})",
                raw.latitude, raw.longitude
            ))
        })
    }
}

fn round6(value: f64) -> f64 {
    (value * PRECISION).round() / PRECISION
}

/// Haversine distance between two lon/lat points, in kilometres.
pub fn haversine_km(a: geo::Point<f64>, b: geo::Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
