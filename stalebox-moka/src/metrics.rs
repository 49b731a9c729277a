//! Moka backend capacity metrics.
//!
//! Enable the `metrics` feature to record these metrics.
//!
//! ## Metrics
//!
//! - `stalebox_moka_entries` - Current number of entries in the cache (gauge)
//! - `stalebox_moka_size_bytes` - Current weighted size in bytes (gauge)
//!
//! Both metrics include a `backend` label to distinguish between multiple Moka instances.
//! They are refreshed after every write.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for cache entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "stalebox_moka_entries",
            "Current number of entries in the Moka cache."
        );
        "stalebox_moka_entries"
    };

    /// Metric name for cache size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "stalebox_moka_size_bytes",
            "Current weighted size of the Moka cache in bytes."
        );
        "stalebox_moka_size_bytes"
    };
}

/// Record current cache capacity metrics.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(backend: &str, entries: u64, size_bytes: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "backend" => backend.to_string()).set(size_bytes as f64);
}

/// Record current cache capacity metrics (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_backend: &str, _entries: u64, _size_bytes: u64) {}
