//! OpenWeatherMap client.
//!
//! Calls the current-conditions endpoint by city name or city id and
//! normalizes failures into [`DashboardError`]. Payloads are passed through
//! as untyped JSON; only the handful of fields needed to track a city are
//! read out of a name lookup.

use async_trait::async_trait;
use dashboard_common::{json_text, DashboardError, DashboardResult, ResolvedCity, WeatherProvider};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("weather-dashboard/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the provider.
#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    /// Base URL up to and excluding `/weather`.
    pub base_url: String,
    /// `appid` credential. Without it every call fails with `Config`.
    pub api_key: Option<String>,
    /// Unit system requested from the provider.
    pub units: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            units: DEFAULT_UNITS.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// OpenWeatherMap API client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: OpenWeatherConfig) -> DashboardResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Whether a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> DashboardResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| DashboardError::Config("Missing OPENWEATHER_KEY".to_string()))
    }

    /// Issue a current-conditions request with a single lookup parameter.
    async fn current_weather(
        &self,
        lookup: (&str, &str),
    ) -> DashboardResult<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = format!("{}/weather", self.config.base_url.trim_end_matches('/'));

        debug!("Fetching current weather: {} {}={}", url, lookup.0, lookup.1);

        let resp = self
            .client
            .get(&url)
            .query(&[
                lookup,
                ("appid", api_key),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                DashboardError::Upstream(format!("HTTP error for {}={}: {}", lookup.0, lookup.1, e))
            })?;

        Ok(resp)
    }
}

/// Status and JSON body of a provider reply.
///
/// The provider reports errors as JSON too, so the body is decoded whatever
/// the status. A body that is not JSON reads as `None`.
async fn json_reply(resp: reqwest::Response) -> DashboardResult<(StatusCode, Option<Value>)> {
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| DashboardError::Upstream(format!("Failed to read response body: {}", e)))?;

    match serde_json::from_slice(&bytes) {
        Ok(payload) => Ok((status, Some(payload))),
        Err(e) => {
            let snippet = String::from_utf8_lossy(&bytes[..bytes.len().min(500)]);
            warn!("Provider returned {} with a non-JSON body ({}): {}", status, e, snippet);
            Ok((status, None))
        }
    }
}

/// Extract the tracked-city fields from a name lookup payload.
///
/// Returns `None` when the payload carries no usable id.
pub fn resolve_from_payload(payload: &Value, requested_name: &str) -> Option<ResolvedCity> {
    let city_code = json_text(&payload["id"]);
    if city_code.is_empty() || city_code == "0" {
        return None;
    }

    let city_name = match json_text(&payload["name"]) {
        name if name.is_empty() => requested_name.to_string(),
        name => name,
    };

    Some(ResolvedCity {
        city_code,
        city_name,
        temp: json_text(&payload["main"]["temp"]),
        condition: json_text(&payload["weather"][0]["main"]),
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn resolve_by_name(&self, name: &str) -> DashboardResult<ResolvedCity> {
        let resp = self.current_weather(("q", name)).await?;
        let (status, payload) = json_reply(resp).await?;

        match payload {
            Some(payload) => {
                if !status.is_success() {
                    debug!("Name lookup for '{}' returned {}: {}", name, status, payload);
                }
                resolve_from_payload(&payload, name)
                    .ok_or_else(|| DashboardError::NotFound("City not found".to_string()))
            }
            None if status == StatusCode::NOT_FOUND => {
                Err(DashboardError::NotFound("City not found".to_string()))
            }
            None => Err(DashboardError::Upstream(format!(
                "Provider returned {} with an unreadable body for q={}",
                status, name
            ))),
        }
    }

    async fn fetch_by_id(&self, city_code: &str) -> DashboardResult<Value> {
        let resp = self.current_weather(("id", city_code)).await?;
        let (status, payload) = json_reply(resp).await?;

        match payload {
            Some(payload) => {
                if !status.is_success() {
                    warn!("Weather lookup for {} returned {}: {}", city_code, status, payload);
                }
                Ok(payload)
            }
            None => Err(DashboardError::Upstream(format!(
                "Provider returned {} with an unreadable body for id={}",
                status, city_code
            ))),
        }
    }
}
