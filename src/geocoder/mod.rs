//! Reverse geocoding.
//!
//! The resolver only needs a municipality-like and a subdivision-like string
//! for a coordinate; [`ReverseGeocoder`] is that seam and [`NominatimClient`]
//! is the HTTP implementation.

mod nominatim;

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use crate::models::Coordinate;

pub use nominatim::{NominatimClient, MUNICIPALITY_FIELDS, SUBDIVISION_FIELDS};

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid geocoder endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    #[error("geocoder response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("geocoder error: {0}")]
    Service(String),
}

/// The address fields the resolver cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A reverse geocoding backend
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<ReverseAddress, GeocodeError>> + Send;
}

impl<T: ReverseGeocoder> ReverseGeocoder for std::sync::Arc<T> {
    fn reverse(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<ReverseAddress, GeocodeError>> + Send {
        (**self).reverse(coordinate)
    }
}
