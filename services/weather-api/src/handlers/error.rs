//! Mapping of dashboard errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use dashboard_common::DashboardError;

/// Message returned when the upstream credential is absent.
pub const MISSING_KEY_MESSAGE: &str = "Missing OPENWEATHER_KEY on server";

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error ready to be sent to the client as `{error: ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Translate a dashboard error.
    ///
    /// Client errors carry their own message. Server-side failures are
    /// logged with their cause and reported with `failure_message`.
    pub fn from_dashboard(err: DashboardError, failure_message: &str) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match err {
            DashboardError::InvalidInput(message) | DashboardError::NotFound(message) => {
                Self::new(status, message)
            }
            DashboardError::Config(cause) => {
                tracing::error!("Configuration error: {}", cause);
                Self::new(status, MISSING_KEY_MESSAGE)
            }
            other => {
                tracing::error!("{}: {}", failure_message, other);
                Self::new(status, failure_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
