//! Common types shared by the weather dashboard crates.

pub mod city;
pub mod error;
pub mod provider;

pub use city::{json_text, AddOutcome, City, ResolvedCity};
pub use error::{DashboardError, DashboardResult};
pub use provider::WeatherProvider;
