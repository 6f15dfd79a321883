//! Error types for the weather dashboard.

use thiserror::Error;

/// Result type alias using DashboardError.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Primary error type for dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    // === Client Errors ===
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    // === Upstream Errors ===
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DashboardError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DashboardError::InvalidInput(_) => 400,
            DashboardError::NotFound(_) => 404,
            DashboardError::Upstream(_)
            | DashboardError::Config(_)
            | DashboardError::Storage(_) => 500,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Storage(format!("JSON error: {}", err))
    }
}
