//! Output of the location resolution pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Where the final coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// GPS embedded in the photo's metadata
    PhotoMetadata,
    /// Device positioning fix taken during live capture
    LiveFix,
    /// No evidence; the configured pending location was substituted
    Sentinel,
}

impl EvidenceSource {
    pub fn is_direct(&self) -> bool {
        !matches!(self, EvidenceSource::Sentinel)
    }
}

/// Where the final subdivision label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubdivisionSource {
    /// Distance match against the local catalog
    Local,
    /// Fuzzy match of a reverse-geocoded address
    Remote,
    /// Supplied by the reporter
    Manual,
    /// Nothing matched and no manual choice was given; name and region are
    /// left empty and the result cannot be finalized
    Unresolved,
}

/// Transient location evidence for a single resolution call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawLocationEvidence {
    Metadata(Coordinate),
    Live(Coordinate),
    None,
}

impl RawLocationEvidence {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            RawLocationEvidence::Metadata(c) | RawLocationEvidence::Live(c) => Some(*c),
            RawLocationEvidence::None => None,
        }
    }

    pub fn source(&self) -> EvidenceSource {
        match self {
            RawLocationEvidence::Metadata(_) => EvidenceSource::PhotoMetadata,
            RawLocationEvidence::Live(_) => EvidenceSource::LiveFix,
            RawLocationEvidence::None => EvidenceSource::Sentinel,
        }
    }
}

/// Resolved location handed to record creation.
///
/// `subdivision_name` and `parent_region` may be empty: a coordinate that is
/// far from every known subdivision is a valid outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub coordinate: Coordinate,

    pub subdivision_name: String,

    pub parent_region: String,

    /// True when the coordinate came from photo metadata or a live fix
    pub has_direct_evidence: bool,

    pub evidence: EvidenceSource,

    pub subdivision_source: SubdivisionSource,

    pub resolved_at: DateTime<Utc>,
}

impl ResolutionResult {
    /// A report can only be finalized once it carries a subdivision label.
    pub fn is_finalizable(&self) -> bool {
        !self.subdivision_name.trim().is_empty()
    }
}
