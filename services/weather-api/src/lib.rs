//! Weather dashboard backend.
//!
//! This crate provides the HTTP surface over the tracked city list and the
//! cached upstream weather lookups.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
