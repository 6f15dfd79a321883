//! In-memory cache of upstream weather payloads, keyed by city id.
//!
//! Entries are overwritten on every successful upstream fetch and are only
//! usable while younger than the TTL. Stale entries are left in place; the
//! map grows with the number of distinct cities ever fetched.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default time-to-live for cached payloads (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cached payload entry.
struct CacheEntry {
    /// Upstream payload, returned verbatim.
    payload: Value,
    /// When this entry was inserted.
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Statistics for the weather cache.
#[derive(Default)]
pub struct WeatherCacheStats {
    /// Total cache hits.
    pub hits: AtomicU64,
    /// Total cache misses (absent or stale).
    pub misses: AtomicU64,
    /// Misses caused by a stale entry.
    pub expired: AtomicU64,
}

impl WeatherCacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Per-city weather payload cache.
pub struct WeatherCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    stats: WeatherCacheStats,
}

impl WeatherCache {
    /// Create a new cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        tracing::info!("WeatherCache initialized: ttl_secs={}", ttl.as_secs());

        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            stats: WeatherCacheStats::default(),
        }
    }

    /// Get the cached payload for a city if it is still fresh.
    pub async fn get(&self, city_code: &str) -> Option<Value> {
        let entries = self.entries.read().await;

        match entries.get(city_code) {
            Some(entry) if entry.is_fresh(self.ttl) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.payload.clone())
            }
            Some(_) => {
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a payload for a city, replacing any previous entry.
    pub async fn put(&self, city_code: impl Into<String>, payload: Value) {
        let entry = CacheEntry {
            payload,
            inserted_at: Instant::now(),
        };
        self.entries.write().await.insert(city_code.into(), entry);
    }

    /// Number of entries held, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &WeatherCacheStats {
        &self.stats
    }
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
