//! Configuration types for the binwatch service

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub air_quality: AirQualityConfig,
    #[serde(default)]
    pub map: MapConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Relational store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Create missing tables at startup
    #[serde(default = "default_true")]
    pub init_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout: default_acquire_timeout(),
            init_schema: true,
        }
    }
}

/// Thresholds used to derive a bin's air-quality status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityConfig {
    #[serde(default = "default_bad_threshold")]
    pub bad_threshold: f64,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            bad_threshold: default_bad_threshold(),
        }
    }
}

/// Static location-name to coordinate lookup for the map view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_map_center")]
    pub center: [f64; 2],
    #[serde(default = "default_locations")]
    pub locations: BTreeMap<String, [f64; 2]>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_map_center(),
            locations: default_locations(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://binwatch.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

fn default_bad_threshold() -> f64 {
    100.0
}

fn default_map_center() -> [f64; 2] {
    [8.2280, 124.2451]
}

fn default_locations() -> BTreeMap<String, [f64; 2]> {
    [
        ("MSU-IIT", [8.2398, 124.2448]),
        ("SMC", [8.2287, 124.2396]),
        ("AMCC", [8.24063, 124.24791]),
        ("SPC", [8.2318, 124.2364]),
        ("ICC", [8.2224, 124.2406]),
    ]
    .into_iter()
    .map(|(name, coords)| (name.to_string(), coords))
    .collect()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::BinwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
