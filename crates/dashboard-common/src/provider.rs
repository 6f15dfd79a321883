//! Seam between the dashboard state and the upstream weather provider.

use async_trait::async_trait;
use serde_json::Value;

use crate::city::ResolvedCity;
use crate::error::DashboardResult;

/// Upstream weather data source.
///
/// Implementations translate domain lookups into provider calls and
/// normalize failures into [`DashboardError`](crate::DashboardError):
/// `NotFound` when a name cannot be resolved, `Upstream` for transport or
/// decode failures and `Config` when no credential is available.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve a free-text city name to the provider's canonical city.
    async fn resolve_by_name(&self, name: &str) -> DashboardResult<ResolvedCity>;

    /// Fetch current conditions for a city id, returned unmodified.
    async fn fetch_by_id(&self, city_code: &str) -> DashboardResult<Value>;
}
