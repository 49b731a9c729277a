//! Metrics declaration and recording.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

pub use stalebox_backend::metrics::Timer;

#[cfg(feature = "metrics")]
lazy_static! {
    // Cache status metrics

    /// Track number of responses served from the primary tier.
    pub static ref PRIMARY_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_primary_hit_total",
            "Total number of responses served from the primary cache tier."
        );
        "stalebox_primary_hit_total"
    };
    /// Track number of primary tier misses.
    pub static ref PRIMARY_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_primary_miss_total",
            "Total number of primary cache tier misses."
        );
        "stalebox_primary_miss_total"
    };
    /// Track number of responses served from the stale tier.
    pub static ref STALE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_stale_hit_total",
            "Total number of stale responses served after an upstream failure."
        );
        "stalebox_stale_hit_total"
    };

    // Upstream metrics

    /// Track number of failed upstream calls.
    pub static ref UPSTREAM_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_upstream_error_total",
            "Total number of upstream calls that failed."
        );
        "stalebox_upstream_error_total"
    };
    /// Metric of upstream call timings.
    pub static ref UPSTREAM_DURATION_HISTOGRAM: &'static str = {
        metrics::describe_histogram!(
            "stalebox_upstream_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of upstream requests in seconds."
        );
        "stalebox_upstream_duration_seconds"
    };

    // Swallowed cache errors

    /// Track number of cache reads handled as a miss because of an error.
    pub static ref CACHE_READ_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_cache_read_errors_total",
            "Total number of cache reads that failed or returned a malformed entry."
        );
        "stalebox_cache_read_errors_total"
    };
    /// Track number of cache writes that were skipped or failed.
    pub static ref CACHE_WRITE_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stalebox_cache_write_errors_total",
            "Total number of responses that could not be written to the cache."
        );
        "stalebox_cache_write_errors_total"
    };
}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_primary_hit() {
    metrics::counter!(*PRIMARY_HIT_COUNTER).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_primary_hit() {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_primary_miss() {
    metrics::counter!(*PRIMARY_MISS_COUNTER).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_primary_miss() {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_stale_hit() {
    metrics::counter!(*STALE_HIT_COUNTER).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_stale_hit() {}

/// Records an upstream call and whether it failed.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_upstream(duration: Duration, failed: bool) {
    metrics::histogram!(*UPSTREAM_DURATION_HISTOGRAM).record(duration.as_secs_f64());
    if failed {
        metrics::counter!(*UPSTREAM_ERROR_COUNTER).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_upstream(_duration: Duration, _failed: bool) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_cache_read_error() {
    metrics::counter!(*CACHE_READ_ERROR_COUNTER).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_cache_read_error() {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_cache_write_error() {
    metrics::counter!(*CACHE_WRITE_ERROR_COUNTER).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_cache_write_error() {}
