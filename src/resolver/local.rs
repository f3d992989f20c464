//! Distance-based subdivision matching against the catalog.

use std::sync::Arc;
use tracing::debug;

use crate::catalog::SubdivisionCatalog;
use crate::models::{Coordinate, SubdivisionRecord};

/// Default nearest-center distance accepted when nothing contains the point
pub const DEFAULT_FALLBACK_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The point lies within the subdivision's containment radius
    Containment,
    /// Best-effort match on the globally nearest center
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMatch<'a> {
    pub record: &'a SubdivisionRecord,
    pub distance_km: f64,
    pub kind: MatchKind,
}

/// Two-phase nearest-subdivision matcher.
///
/// Equal distances resolve to the earlier catalog entry. Real coordinates
/// practically never tie, so no further tie-break is applied.
pub struct LocalResolver {
    catalog: Arc<SubdivisionCatalog>,
    fallback_radius_km: f64,
}

impl LocalResolver {
    pub fn new(catalog: Arc<SubdivisionCatalog>, fallback_radius_km: f64) -> Self {
        Self {
            catalog,
            fallback_radius_km,
        }
    }

    pub fn catalog(&self) -> &SubdivisionCatalog {
        &self.catalog
    }

    pub fn resolve(&self, coordinate: &Coordinate) -> Option<LocalMatch<'_>> {
        let mut containing: Option<(&SubdivisionRecord, f64)> = None;
        let mut nearest: Option<(&SubdivisionRecord, f64)> = None;

        for record in self.catalog.iter() {
            let distance = record.distance_km(coordinate);

            if distance <= record.containment_radius_km
                && containing.map_or(true, |(_, best)| distance < best)
            {
                containing = Some((record, distance));
            }
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((record, distance));
            }
        }

        if let Some((record, distance_km)) = containing {
            debug!(
                "{} is inside {} ({:.3} km from center)",
                coordinate, record.name, distance_km
            );
            return Some(LocalMatch {
                record,
                distance_km,
                kind: MatchKind::Containment,
            });
        }

        match nearest {
            Some((record, distance_km)) if distance_km <= self.fallback_radius_km => {
                debug!(
                    "{} matched nearest center {} at {:.3} km",
                    coordinate, record.name, distance_km
                );
                Some(LocalMatch {
                    record,
                    distance_km,
                    kind: MatchKind::Nearest,
                })
            }
            Some((record, distance_km)) => {
                debug!(
                    "{} too far from any subdivision (nearest {} at {:.3} km)",
                    coordinate, record.name, distance_km
                );
                None
            }
            None => None,
        }
    }
}
