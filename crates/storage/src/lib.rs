//! Storage for the weather dashboard.
//!
//! Provides:
//! - A JSON-file backed list of tracked cities
//! - An in-memory, TTL-bounded cache of upstream weather payloads

pub mod city_store;
pub mod weather_cache;

pub use city_store::{CityStore, LIST_FIELD};
pub use weather_cache::{WeatherCache, WeatherCacheStats, DEFAULT_TTL};
