//! Application state for the weather API.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use dashboard_common::{AddOutcome, DashboardError, DashboardResult, WeatherProvider};
use openweather_client::OpenWeatherClient;
use storage::{CityStore, WeatherCache};

use crate::config::DashboardConfig;
use crate::metrics::{MetricsCollector, UpstreamOutcome};

/// Weather payload plus where it came from.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    pub from_cache: bool,
    pub data: Value,
}

/// Shared application state.
pub struct AppState {
    /// Tracked cities, persisted to `config.cities_file`.
    pub cities: CityStore,

    /// Recent upstream payloads by city id.
    pub weather_cache: WeatherCache,

    /// Upstream weather provider.
    pub provider: Arc<dyn WeatherProvider>,

    pub metrics: MetricsCollector,

    /// Prometheus exporter handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,

    pub config: DashboardConfig,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state backed by the OpenWeatherMap client.
    pub async fn new(config: DashboardConfig) -> Result<Self> {
        if config.upstream.api_key.is_none() {
            tracing::warn!("OPENWEATHER_KEY is not set; upstream-backed endpoints will fail");
        }

        let client = OpenWeatherClient::new(config.openweather())
            .context("Failed to create OpenWeatherMap client")?;

        Ok(Self::with_provider(config, Arc::new(client)).await)
    }

    /// Create state around an explicit provider.
    pub async fn with_provider(config: DashboardConfig, provider: Arc<dyn WeatherProvider>) -> Self {
        let cities = CityStore::load(&config.cities_file).await;
        let weather_cache = WeatherCache::new(config.cache_ttl());

        Self {
            cities,
            weather_cache,
            provider,
            metrics: MetricsCollector::new(),
            prometheus: None,
            config,
            started_at: Utc::now(),
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Resolve a city by name and start tracking it.
    pub async fn add_city(&self, name: &str) -> DashboardResult<AddOutcome> {
        let started = Instant::now();
        let result = self.cities.add_city(name, self.provider.as_ref()).await;

        // Blank names and a missing credential never reach the provider
        if !matches!(
            result,
            Err(DashboardError::InvalidInput(_)) | Err(DashboardError::Config(_))
        ) {
            self.metrics
                .record_upstream("resolve_by_name", outcome_of(&result), started.elapsed());
        }

        if let Ok(outcome) = &result {
            if !outcome.already_existed {
                self.metrics.record_city_added();
            }
        }

        result
    }

    /// Stop tracking a city.
    pub async fn remove_city(&self, city_code: &str) -> DashboardResult<String> {
        let removed = self.cities.remove_city(city_code).await?;
        self.metrics.record_city_removed();
        Ok(removed)
    }

    /// Current weather for a city id, served from cache while fresh.
    pub async fn weather(&self, city_code: &str) -> DashboardResult<WeatherLookup> {
        if let Some(data) = self.weather_cache.get(city_code).await {
            self.metrics.record_cache_hit();
            return Ok(WeatherLookup {
                from_cache: true,
                data,
            });
        }
        self.metrics.record_cache_miss();

        let started = Instant::now();
        let result = self.provider.fetch_by_id(city_code).await;
        if !matches!(result, Err(DashboardError::Config(_))) {
            self.metrics
                .record_upstream("fetch_by_id", outcome_of(&result), started.elapsed());
        }

        let data = result?;
        self.weather_cache.put(city_code, data.clone()).await;

        Ok(WeatherLookup {
            from_cache: false,
            data,
        })
    }
}

fn outcome_of<T>(result: &DashboardResult<T>) -> UpstreamOutcome {
    match result {
        Ok(_) => UpstreamOutcome::Ok,
        Err(DashboardError::NotFound(_)) => UpstreamOutcome::NotFound,
        Err(_) => UpstreamOutcome::Error,
    }
}
