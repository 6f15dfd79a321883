//! Health and metrics handlers.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub started_at: String,
    pub uptime_secs: u64,
    pub cities: usize,
    pub cache_entries: usize,
    pub cache_hit_rate: f64,
    pub upstream_configured: bool,
}

/// GET /health - Liveness plus a summary of in-memory state
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.metrics.uptime().as_secs(),
        cities: state.cities.len().await,
        cache_entries: state.weather_cache.len().await,
        cache_hit_rate: state.weather_cache.stats().hit_rate(),
        upstream_configured: state.config.upstream.api_key.is_some(),
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    state.metrics.record_state(
        state.cities.len().await,
        state.weather_cache.len().await,
        state.cities.persist_failures(),
    );

    let body = match &state.prometheus {
        Some(handle) => handle.render(),
        None => state.metrics.render_plain(),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
