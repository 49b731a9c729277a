//! Store metrics.
//!
//! Enable the `metrics` feature to record these metrics; without it every
//! function here is an empty inline call.
//!
//! ## Naming Pattern
//!
//! All metrics follow the pattern: `stalebox_backend_{operation}_{metric_type}`
//!
//! - `stalebox_backend_read_*` - point reads of either tier
//! - `stalebox_backend_write_*` - atomic dual writes

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use stalebox_core::BackendLabel;

/// Stopwatch for store and upstream calls.
///
/// Without the `metrics` feature it is zero-sized and always reads zero.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts the stopwatch.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Time since [`Timer::new`].
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        return self.start.elapsed();
        #[cfg(not(feature = "metrics"))]
        Duration::ZERO
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for total read operations counter.
    pub static ref BACKEND_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_read_total",
            "Total number of cache read operations per backend."
        );
        "stalebox_backend_read_total"
    };

    /// Metric name for read duration histogram.
    pub static ref BACKEND_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stalebox_backend_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of backend read operations in seconds."
        );
        "stalebox_backend_read_duration_seconds"
    };

    /// Metric name for total bytes read counter.
    pub static ref BACKEND_READ_BYTES: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_read_bytes_total",
            "Total bytes read from cache per backend."
        );
        "stalebox_backend_read_bytes_total"
    };

    /// Metric name for read errors counter.
    pub static ref BACKEND_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_read_errors_total",
            "Total number of cache read errors per backend."
        );
        "stalebox_backend_read_errors_total"
    };

    /// Metric name for total write operations counter.
    pub static ref BACKEND_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_write_total",
            "Total number of cache write operations per backend."
        );
        "stalebox_backend_write_total"
    };

    /// Metric name for write duration histogram.
    pub static ref BACKEND_WRITE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stalebox_backend_write_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of backend write operations in seconds."
        );
        "stalebox_backend_write_duration_seconds"
    };

    /// Metric name for total bytes written counter.
    pub static ref BACKEND_WRITE_BYTES: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_write_bytes_total",
            "Total bytes written to cache per backend."
        );
        "stalebox_backend_write_bytes_total"
    };

    /// Metric name for write errors counter.
    pub static ref BACKEND_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "stalebox_backend_write_errors_total",
            "Total number of cache write errors per backend."
        );
        "stalebox_backend_write_errors_total"
    };
}

/// Records a read of `bytes` bytes (zero on a miss) or a failed read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(backend: &BackendLabel, bytes: usize, success: bool, duration: Duration) {
    let backend = backend.as_str().to_owned();
    metrics::counter!(*BACKEND_READ_TOTAL, "backend" => backend.clone()).increment(1);
    metrics::histogram!(*BACKEND_READ_DURATION, "backend" => backend.clone())
        .record(duration.as_secs_f64());
    if success {
        metrics::counter!(*BACKEND_READ_BYTES, "backend" => backend).increment(bytes as u64);
    } else {
        metrics::counter!(*BACKEND_READ_ERRORS, "backend" => backend).increment(1);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_backend: &BackendLabel, _bytes: usize, _success: bool, _duration: Duration) {}

/// Records a multi-key write of `bytes` bytes in total.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(backend: &BackendLabel, bytes: usize, success: bool, duration: Duration) {
    let backend = backend.as_str().to_owned();
    metrics::counter!(*BACKEND_WRITE_TOTAL, "backend" => backend.clone()).increment(1);
    metrics::histogram!(*BACKEND_WRITE_DURATION, "backend" => backend.clone())
        .record(duration.as_secs_f64());
    if success {
        metrics::counter!(*BACKEND_WRITE_BYTES, "backend" => backend).increment(bytes as u64);
    } else {
        metrics::counter!(*BACKEND_WRITE_ERRORS, "backend" => backend).increment(1);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_backend: &BackendLabel, _bytes: usize, _success: bool, _duration: Duration) {}
