//! Core data models for location resolution.

pub mod coordinate;
pub mod resolution;
pub mod subdivision;

pub use coordinate::{haversine_km, Coordinate, CENRO_OFFICE, EARTH_RADIUS_KM};
pub use resolution::{EvidenceSource, RawLocationEvidence, ResolutionResult, SubdivisionSource};
pub use subdivision::SubdivisionRecord;
