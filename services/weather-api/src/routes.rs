//! Router construction.

use axum::{
    routing::{delete, get},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the full application router.
///
/// City and weather routes are mounted under `config.api_prefix`; health
/// and metrics stay at the root.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/cities",
            get(handlers::cities::list_cities_handler).post(handlers::cities::add_city_handler),
        )
        .route("/cities/:id", delete(handlers::cities::delete_city_handler))
        .route("/weather/:city_id", get(handlers::weather::weather_handler));

    let prefix = format!("/{}", state.config.api_prefix.trim_matches('/'));
    let router = if prefix == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&prefix, api)
    };

    router
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
