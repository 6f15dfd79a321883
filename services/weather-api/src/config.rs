//! Service configuration loading and types.

use anyhow::{Context, Result};
use openweather_client::{OpenWeatherConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_UNITS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration loaded from YAML, with environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Path of the persisted city list.
    #[serde(default = "default_cities_file")]
    pub cities_file: PathBuf,

    /// Prefix under which the city and weather routes are mounted.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Weather cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream provider settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cities_file: default_cities_file(),
            api_prefix: default_api_prefix(),
            cache: CacheConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields defaults; a file that exists but does not parse
    /// is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Config file {:?} does not exist, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, ignoring empty values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("CITIES_FILE") {
            self.cities_file = PathBuf::from(path);
        }
        if let Some(url) = get("OPENWEATHER_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(ttl) = get("WEATHER_CACHE_TTL_SECS") {
            match ttl.parse() {
                Ok(secs) => self.cache.ttl_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid WEATHER_CACHE_TTL_SECS: {}", ttl),
            }
        }
        self.upstream.api_key = get("OPENWEATHER_KEY");
    }

    /// Cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Client settings for the upstream provider.
    pub fn openweather(&self) -> OpenWeatherConfig {
        OpenWeatherConfig {
            base_url: self.upstream.base_url.clone(),
            api_key: self.upstream.api_key.clone(),
            units: self.upstream.units.clone(),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
        }
    }
}

/// Weather cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a fetched payload stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Upstream provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_units")]
    pub units: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Credential; only ever taken from `OPENWEATHER_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            units: default_units(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_cities_file() -> PathBuf {
    PathBuf::from("data/cities.json")
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_units() -> String {
    DEFAULT_UNITS.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
