//! City list endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityIdsResponse {
    pub city_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCityResponse {
    pub city_id: String,
    pub already: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCityResponse {
    pub deleted: bool,
    pub city_id: String,
}

/// GET /cities - List tracked city ids
pub async fn list_cities_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<CityIdsResponse> {
    Json(CityIdsResponse {
        city_ids: state.cities.list_ids().await,
    })
}

/// POST /cities - Resolve a city by name and track it
///
/// An absent or malformed body, or a `name` that is not a string, counts
/// as a missing name.
pub async fn add_city_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AddCityResponse>, ApiError> {
    let name = match &body {
        Ok(Json(body)) => body.get("name").and_then(Value::as_str).unwrap_or(""),
        Err(rejection) => {
            tracing::debug!("Rejected add-city body: {}", rejection);
            ""
        }
    };

    let outcome = state
        .add_city(name)
        .await
        .map_err(|e| ApiError::from_dashboard(e, "Failed to add city"))?;

    Ok(Json(AddCityResponse {
        city_id: outcome.city_code,
        already: outcome.already_existed,
    }))
}

/// DELETE /cities/:id - Stop tracking a city
pub async fn delete_city_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<DeleteCityResponse>, ApiError> {
    let city_id = state
        .remove_city(&city_id)
        .await
        .map_err(|e| ApiError::from_dashboard(e, "Failed to remove city"))?;

    Ok(Json(DeleteCityResponse {
        deleted: true,
        city_id,
    }))
}
