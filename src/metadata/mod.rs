//! Photo metadata parsing and GPS extraction.
//!
//! Photo bytes are read into a [`MetadataTree`] (EXIF and XMP, whichever the
//! file carries), then the ordered [`GpsStrategy`] list is tried until one
//! yields a coordinate that passes validation. Nothing here returns an error
//! to the caller: unreadable or GPS-less photos simply produce `None`.

mod reader;
mod strategy;
mod xmp;

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::models::Coordinate;

pub use reader::read_metadata;
pub use strategy::{dms_to_decimal, GpsStrategy};

/// Errors while reading metadata out of photo bytes
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("photo carries no EXIF or XMP metadata")]
    NotFound,

    #[error("EXIF parse failed: {0}")]
    Exif(#[from] exif::Error),
}

/// A single metadata value, reduced to the shapes GPS extraction cares about
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Number(f64),
    /// Multi-valued numbers, e.g. [degrees, minutes, seconds]
    Components(Vec<f64>),
    Text(String),
}

impl MetaValue {
    /// Single numeric value. Text is parsed when it holds a plain number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => Some(*n),
            MetaValue::Components(v) if v.len() == 1 => Some(v[0]),
            MetaValue::Components(_) => None,
            MetaValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Component array; a lone number counts as degrees only.
    pub fn as_components(&self) -> Option<Vec<f64>> {
        match self {
            MetaValue::Number(n) => Some(vec![*n]),
            MetaValue::Components(v) if !v.is_empty() => Some(v.clone()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

pub type Fields = BTreeMap<String, MetaValue>;

/// Parsed metadata: top-level fields plus named sub-structures
/// (`gps` for the EXIF GPS directory, XMP prefixes for everything else).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    pub root: Fields,
    pub namespaces: BTreeMap<String, Fields>,
}

impl MetadataTree {
    pub fn namespace(&self, name: &str) -> Option<&Fields> {
        self.namespaces.get(name)
    }

    /// Insert a top-level field; the first value seen for a key wins.
    pub fn insert_root(&mut self, key: &str, value: MetaValue) {
        self.root.entry(key.to_string()).or_insert(value);
    }

    /// Insert a field into a namespace; the first value seen for a key wins.
    pub fn insert(&mut self, namespace: &str, key: &str, value: MetaValue) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert(value);
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.namespaces.values().all(|f| f.is_empty())
    }
}

/// Extract a validated coordinate from raw photo bytes.
pub fn extract_coordinate(bytes: &[u8]) -> Option<Coordinate> {
    let tree = match read_metadata(bytes) {
        Ok(tree) => tree,
        Err(e) => {
            debug!("No usable photo metadata: {}", e);
            return None;
        }
    };

    extract_from_tree(&tree)
}

/// Run every strategy in order and return the first valid coordinate.
pub fn extract_from_tree(tree: &MetadataTree) -> Option<Coordinate> {
    for strategy in GpsStrategy::ALL {
        if let Some(coordinate) = strategy.extract(tree) {
            debug!("GPS {} found via {}", coordinate, strategy.name());
            return Some(coordinate);
        }
    }

    debug!("No GPS strategy produced a valid coordinate");
    None
}
