//! Configuration loading.
//!
//! Settings come from a TOML file (`config.toml` next to the process, or the
//! path named by `HMCOLLECT_CONFIG`) with `HMCOLLECT_`-prefixed environment
//! variables layered on top. There are no CLI flags; a run is fully described
//! by its configuration.

use std::env;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::error::{CollectorError, Result};

/// Environment variable naming the configuration file
const CONFIG_PATH_VAR: &str = "HMCOLLECT_CONFIG";

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// CCU XML-API ingestion (used by `homematic-influx`)
    #[serde(default)]
    pub homematic: Option<CcuConfig>,

    /// Homematic IP ingestion (used by `homematic-influx-ip`)
    #[serde(default)]
    pub homematicip: Option<HmipConfig>,

    /// Time-series sink
    pub influxdb: InfluxConfig,
}

/// CCU XML-API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CcuConfig {
    /// CCU base URL (e.g. "http://ccu.local")
    pub ccu_url: Url,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// Upper bound on concurrent per-device state requests
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

/// Homematic IP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HmipConfig {
    /// Access point id (SGTIN, e.g. "3014-F711-...")
    pub access_point: String,

    /// Auth token issued for this client
    pub auth_token: String,

    /// REST endpoint; when unset the public lookup service resolves it
    #[serde(default)]
    pub url: Option<Url>,

    /// Lookup service override
    #[serde(default)]
    pub lookup_url: Option<Url>,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

/// InfluxDB 2.x sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxConfig {
    /// Server URL (e.g. "http://influx:8086")
    pub url: Url,

    /// API token
    pub token: String,

    /// Organization name
    pub org: String,

    /// Target bucket
    pub bucket: String,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_in_flight() -> usize {
    4
}

impl Settings {
    /// Load settings from the default location, honoring `HMCOLLECT_CONFIG`.
    pub fn new() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(&path)
    }

    /// Load settings from an explicit file path plus the environment overlay.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("HMCOLLECT").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The `[homematic]` section, required by the XML-API binary.
    pub fn homematic(&self) -> Result<&CcuConfig> {
        self.homematic
            .as_ref()
            .ok_or_else(|| CollectorError::config("missing [homematic] section"))
    }

    /// The `[homematicip]` section, required by the Homematic IP binary.
    pub fn homematicip(&self) -> Result<&HmipConfig> {
        self.homematicip
            .as_ref()
            .ok_or_else(|| CollectorError::config("missing [homematicip] section"))
    }
}
