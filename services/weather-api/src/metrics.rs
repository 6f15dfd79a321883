//! Application metrics collection and reporting.

use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Outcome label for an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Ok,
    NotFound,
    Error,
}

impl UpstreamOutcome {
    fn label(self) -> &'static str {
        match self {
            UpstreamOutcome::Ok => "ok",
            UpstreamOutcome::NotFound => "not_found",
            UpstreamOutcome::Error => "error",
        }
    }
}

/// Metrics collector for the weather API.
///
/// Counters are mirrored into atomics so `/metrics` and `/health` can
/// report them without a recorder installed.
#[derive(Debug)]
pub struct MetricsCollector {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub upstream_requests: AtomicU64,
    pub upstream_errors: AtomicU64,
    pub cities_added: AtomicU64,
    pub cities_removed: AtomicU64,

    /// Last city-file write failure count reported by the store
    pub persist_failures: AtomicU64,

    /// Start time for uptime calculation
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            upstream_requests: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
            cities_added: AtomicU64::new(0),
            cities_removed: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a weather read served from cache
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("weather_cache_hits_total").increment(1);
    }

    /// Record a weather read that had to go upstream
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        counter!("weather_cache_misses_total").increment(1);
    }

    /// Record a completed upstream call
    pub fn record_upstream(&self, operation: &'static str, outcome: UpstreamOutcome, elapsed: Duration) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
        if outcome == UpstreamOutcome::Error {
            self.upstream_errors.fetch_add(1, Ordering::Relaxed);
        }
        counter!(
            "upstream_requests_total",
            "operation" => operation,
            "outcome" => outcome.label()
        )
        .increment(1);
        histogram!("upstream_request_duration_ms", "operation" => operation)
            .record(elapsed.as_secs_f64() * 1000.0);
    }

    /// Record a new tracked city
    pub fn record_city_added(&self) {
        self.cities_added.fetch_add(1, Ordering::Relaxed);
        counter!("cities_added_total").increment(1);
    }

    /// Record a removed city
    pub fn record_city_removed(&self) {
        self.cities_removed.fetch_add(1, Ordering::Relaxed);
        counter!("cities_removed_total").increment(1);
    }

    /// Publish point-in-time store and cache sizes.
    ///
    /// The store owns the persist-failure count, so the counter is set to
    /// its absolute value rather than incremented.
    pub fn record_state(&self, cities: usize, cache_entries: usize, persist_failures: u64) {
        gauge!("cities_tracked").set(cities as f64);
        gauge!("weather_cache_entries").set(cache_entries as f64);
        gauge!("uptime_seconds").set(self.uptime().as_secs_f64());

        self.persist_failures.store(persist_failures, Ordering::Relaxed);
        counter!("city_store_persist_failures_total").absolute(persist_failures);
    }

    /// Time since startup
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Render the mirrored counters in Prometheus text format.
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let counters = [
            ("weather_cache_hits_total", "Weather reads served from cache", &self.cache_hits),
            ("weather_cache_misses_total", "Weather reads that went upstream", &self.cache_misses),
            ("upstream_requests_total", "Upstream provider calls", &self.upstream_requests),
            ("upstream_errors_total", "Failed upstream provider calls", &self.upstream_errors),
            ("cities_added_total", "Cities added", &self.cities_added),
            ("cities_removed_total", "Cities removed", &self.cities_removed),
            (
                "city_store_persist_failures_total",
                "City file writes that failed",
                &self.persist_failures,
            ),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            ));
        }
        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
