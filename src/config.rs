//! Runtime configuration.
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below.

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::{Coordinate, CENRO_OFFICE};
use crate::resolver::DEFAULT_FALLBACK_RADIUS_KM;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub geocoder: GeocoderConfig,
    pub resolver: ResolverConfig,
    pub sentinel: SentinelConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Disable to run fully offline (local catalog only)
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub zoom: u8,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: concat!("sighting-locator/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            zoom: 18,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    /// Nearest-center distance still accepted when no subdivision contains the point
    pub fallback_radius_km: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_radius_km: DEFAULT_FALLBACK_RADIUS_KM,
        }
    }
}

/// Location substituted when a report carries no coordinate evidence
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SentinelConfig {
    pub label: String,
    pub coordinate: Coordinate,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            label: "CENRO Manolo Fortich".to_string(),
            coordinate: CENRO_OFFICE,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let radius = self.resolver.fallback_radius_km;
        ensure!(
            radius.is_finite() && radius >= 0.0,
            "resolver.fallback_radius_km must be a non-negative number, got {}",
            radius
        );
        ensure!(
            self.geocoder.timeout_secs > 0,
            "geocoder.timeout_secs must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sentinel.coordinate, CENRO_OFFICE);
        assert_eq!(config.resolver.fallback_radius_km, DEFAULT_FALLBACK_RADIUS_KM);
        assert_eq!(config.resolver.fallback_radius_km, 5.0);
        assert_eq!(config.geocoder.zoom, 18);
        assert!(config.geocoder.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[geocoder]
enabled = false

[sentinel]
label = "Field office"
coordinate = {{ latitude = 8.3686, longitude = 124.8634 }}
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert!(!config.geocoder.enabled);
        assert_eq!(config.geocoder.timeout_secs, 10);
        assert_eq!(config.sentinel.label, "Field office");
        assert_eq!(config.sentinel.coordinate.latitude(), 8.3686);
        assert_eq!(config.server.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_sentinel_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sentinel]\ncoordinate = {{ latitude = 0.0, longitude = 0.0 }}"
        )
        .unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let mut config = Config::default();
        config.resolver.fallback_radius_km = -1.0;
        assert!(config.validate().is_err());
    }
}
