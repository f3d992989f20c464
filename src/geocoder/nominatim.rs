//! Nominatim reverse geocoding client.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GeocodeError, ReverseAddress, ReverseGeocoder};
use crate::config::GeocoderConfig;
use crate::models::Coordinate;

/// Address attributes tried, in order, for the municipality
pub const MUNICIPALITY_FIELDS: &[&str] = &["city", "town", "municipality", "county", "state_district"];

/// Address attributes tried, in order, for the subdivision. OSM has no
/// barangay key, so several local-area keys are checked.
pub const SUBDIVISION_FIELDS: &[&str] = &[
    "village",
    "suburb",
    "neighbourhood",
    "hamlet",
    "quarter",
    "city_district",
    "residential",
    "locality",
    "isolated_dwelling",
];

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: HashMap<String, serde_json::Value>,
    error: Option<String>,
}

/// HTTP client for a Nominatim-compatible `/reverse` endpoint
pub struct NominatimClient {
    client: Client,
    endpoint: Url,
    zoom: u8,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            zoom: config.zoom,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, coordinate: Coordinate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &coordinate.latitude().to_string())
            .append_pair("lon", &coordinate.longitude().to_string())
            .append_pair("zoom", &self.zoom.to_string())
            .append_pair("addressdetails", "1");
        url
    }
}

impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coordinate: Coordinate) -> Result<ReverseAddress, GeocodeError> {
        let url = self.request_url(coordinate);
        debug!("Reverse geocoding {} via {}", coordinate, url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Pull the municipality and subdivision out of a Nominatim JSON body.
pub(crate) fn parse_response(body: &str) -> Result<ReverseAddress, GeocodeError> {
    let data: NominatimResponse = serde_json::from_str(body)?;

    if let Some(error) = data.error {
        return Err(GeocodeError::Service(error));
    }

    Ok(ReverseAddress {
        municipality: first_field(&data.address, MUNICIPALITY_FIELDS),
        subdivision: first_field(&data.address, SUBDIVISION_FIELDS),
        display_name: data.display_name,
    })
}

fn first_field(address: &HashMap<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| address.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}
