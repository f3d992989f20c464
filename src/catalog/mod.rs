//! Subdivision catalog.
//!
//! A fixed, read-only table of barangays loaded once per process. Lookups by
//! name are case-insensitive; iteration order is the table order and is the
//! tie-break order for every resolver.

mod data;

use hashbrown::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::models::{Coordinate, SubdivisionRecord};

pub use data::MUNICIPALITY;

static BUILTIN: OnceLock<Arc<SubdivisionCatalog>> = OnceLock::new();

/// Read-only subdivision table with a lowercase name index
#[derive(Debug)]
pub struct SubdivisionCatalog {
    records: Vec<SubdivisionRecord>,
    by_name: HashMap<String, usize>,
}

impl SubdivisionCatalog {
    /// Build a catalog. Later entries whose name repeats an earlier one are
    /// dropped so names stay unique.
    pub fn new(records: Vec<SubdivisionRecord>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());

        for record in records {
            let key = record.name.to_lowercase();
            if by_name.contains_key(&key) {
                warn!("Duplicate subdivision '{}' ignored", record.name);
                continue;
            }
            by_name.insert(key, kept.len());
            kept.push(record);
        }

        Self {
            records: kept,
            by_name,
        }
    }

    /// The process-wide built-in catalog
    pub fn builtin() -> Arc<SubdivisionCatalog> {
        Arc::clone(BUILTIN.get_or_init(|| {
            let records: Vec<SubdivisionRecord> = data::BARANGAYS
                .iter()
                .filter_map(|&(name, lat, lon, radius)| {
                    let center = Coordinate::new(lat, lon)?;
                    Some(SubdivisionRecord::new(name, MUNICIPALITY, center, radius))
                })
                .collect();

            info!(
                "Loaded built-in catalog: {} subdivisions of {}",
                records.len(),
                MUNICIPALITY
            );
            Arc::new(SubdivisionCatalog::new(records))
        }))
    }

    /// Case-insensitive lookup by exact name
    pub fn get(&self, name: &str) -> Option<&SubdivisionRecord> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.records[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubdivisionRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[SubdivisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
