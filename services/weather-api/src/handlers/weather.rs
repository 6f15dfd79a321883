//! Weather endpoint handler.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    pub from_cache: bool,
    /// Upstream payload, unmodified.
    pub data: Value,
}

/// GET /weather/:city_id - Current conditions for a city
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let lookup = state
        .weather(&city_id)
        .await
        .map_err(|e| ApiError::from_dashboard(e, "Failed to fetch weather"))?;

    Ok(Json(WeatherResponse {
        from_cache: lookup.from_cache,
        data: lookup.data,
    }))
}
