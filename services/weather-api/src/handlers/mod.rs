//! HTTP request handlers for the weather API.

pub mod cities;
pub mod error;
pub mod health;
pub mod weather;

pub use error::ApiError;
