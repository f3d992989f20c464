//! Sighting Locator - location resolution for wildlife sighting reports
//!
//! Turns whatever location evidence a report carries (photo metadata, a live
//! device fix, or nothing) into a validated coordinate and a barangay label
//! from a fixed catalog, with a configured pending location as the fallback.

pub mod catalog;
pub mod config;
pub mod geocoder;
pub mod metadata;
pub mod models;
pub mod positioning;
pub mod resolver;

pub use catalog::SubdivisionCatalog;
pub use models::{Coordinate, ResolutionResult, SubdivisionRecord};
pub use resolver::{LocationResolver, ResolveError, Submission};
