//! JSON-file backed list of tracked cities.
//!
//! The file holds `{"List": [ ...city records... ]}`. A bare array is also
//! accepted on read. Every successful mutation rewrites the whole file;
//! write failures are logged and counted but never fail the mutation, so
//! memory and disk may diverge until the next successful write.

use dashboard_common::{
    AddOutcome, City, DashboardError, DashboardResult, WeatherProvider,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Field wrapping the city sequence in the persisted object.
pub const LIST_FIELD: &str = "List";

/// Serialized form of the city file.
#[derive(Serialize)]
struct CityFile<'a> {
    #[serde(rename = "List")]
    list: &'a [City],
}

/// Authoritative set of tracked cities.
pub struct CityStore {
    path: PathBuf,
    cities: RwLock<Vec<City>>,
    persist_failures: AtomicU64,
}

impl CityStore {
    /// Load the store from `path`.
    ///
    /// Loading is best-effort: a missing, unreadable or unparsable file is
    /// logged and the store starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let cities = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match parse_city_file(&text) {
                Ok(cities) => {
                    info!("Loaded {} cities from {:?}", cities.len(), path);
                    cities
                }
                Err(e) => {
                    error!("Could not parse city file {:?}: {}", path, e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Could not read city file {:?}: {}", path, e);
                Vec::new()
            }
        };

        Self::with_cities(path, cities)
    }

    /// Create a store over an explicit list without reading the file.
    pub fn with_cities(path: impl Into<PathBuf>, cities: Vec<City>) -> Self {
        Self {
            path: path.into(),
            cities: RwLock::new(cities),
            persist_failures: AtomicU64::new(0),
        }
    }

    /// All known city ids in insertion order, skipping records without one.
    pub async fn list_ids(&self) -> Vec<String> {
        self.cities
            .read()
            .await
            .iter()
            .filter(|c| c.has_code())
            .map(|c| c.city_code.clone())
            .collect()
    }

    /// Resolve `name` through the provider and track the resulting city.
    ///
    /// Fails with `InvalidInput` for a blank name and propagates the
    /// provider's `NotFound`/`Upstream`/`Config` errors. A city whose id is
    /// already tracked is reported with `already_existed` and not written.
    pub async fn add_city(
        &self,
        name: &str,
        provider: &dyn WeatherProvider,
    ) -> DashboardResult<AddOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::InvalidInput("Missing city name".to_string()));
        }

        let resolved = provider.resolve_by_name(name).await?;
        debug!(
            "Resolved '{}' to city {} ({})",
            name, resolved.city_code, resolved.city_name
        );

        Ok(self.insert(resolved.into()).await)
    }

    /// Append a city unless its id is already tracked.
    pub async fn insert(&self, city: City) -> AddOutcome {
        let mut cities = self.cities.write().await;

        if cities.iter().any(|c| c.city_code == city.city_code) {
            return AddOutcome {
                city_code: city.city_code,
                already_existed: true,
            };
        }

        let city_code = city.city_code.clone();
        info!("Tracking city {} ({})", city_code, city.city_name);
        cities.push(city);
        self.persist(&cities).await;

        AddOutcome {
            city_code,
            already_existed: false,
        }
    }

    /// Stop tracking a city, returning its id.
    pub async fn remove_city(&self, city_code: &str) -> DashboardResult<String> {
        let mut cities = self.cities.write().await;

        let idx = cities
            .iter()
            .position(|c| c.city_code == city_code)
            .ok_or_else(|| DashboardError::NotFound("City not found".to_string()))?;

        let removed = cities.remove(idx);
        info!("Removed city {} ({})", removed.city_code, removed.city_name);
        self.persist(&cities).await;

        Ok(removed.city_code)
    }

    /// Look up a tracked city by id.
    pub async fn get(&self, city_code: &str) -> Option<City> {
        self.cities
            .read()
            .await
            .iter()
            .find(|c| c.city_code == city_code)
            .cloned()
    }

    /// Number of records held, including any without an id.
    pub async fn len(&self) -> usize {
        self.cities.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.cities.read().await.is_empty()
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of writes that failed since startup.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    async fn persist(&self, cities: &[City]) {
        if let Err(e) = write_city_file(&self.path, cities).await {
            self.persist_failures.fetch_add(1, Ordering::Relaxed);
            error!("Failed to persist city file {:?}: {}", self.path, e);
        }
    }
}

/// Parse either `{"List": [...]}` or a bare `[...]`.
///
/// Any other shape yields an empty list. Entries that are not city objects
/// are dropped with a warning.
pub fn parse_city_file(text: &str) -> DashboardResult<Vec<City>> {
    let parsed: Value = serde_json::from_str(text)?;

    let entries = match parsed {
        Value::Object(mut map) => match map.remove(LIST_FIELD) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let cities = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<City>(entry) {
            Ok(city) => Some(city),
            Err(e) => {
                warn!("Skipping malformed city record: {}", e);
                None
            }
        })
        .collect();

    Ok(cities)
}

/// Write the full list to a sibling temp file, then rename over `path`.
async fn write_city_file(path: &Path, cities: &[City]) -> DashboardResult<()> {
    let json = serde_json::to_string_pretty(&CityFile { list: cities })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            warn!("Failed to remove temp city file {:?}: {}", tmp_path, cleanup);
        }
        return Err(e.into());
    }

    Ok(())
}
