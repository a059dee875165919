//! RAII-based timing utilities for measuring and logging operation durations.
//!
//! # Example
//!
//! ```rust,ignore
//! use snapvault_util::timing::TimingGuard;
//!
//! fn write_archive(id: &str) {
//!     let _timing = TimingGuard::archive(id);
//!     // ... compress files ...
//!     // Duration is logged when _timing is dropped
//! }
//! ```

use std::time::Instant;
use tracing::{debug, info, warn};

/// RAII guard that measures and logs the duration of an operation.
///
/// When dropped, logs the elapsed time since creation.
pub struct TimingGuard {
    /// Type of operation (e.g., "collect", "archive", "extract")
    operation_type: &'static str,
    /// Subject of the operation (a snapshot id, a directory)
    operation_name: String,
    start: Instant,
    /// Minimum duration to log at info level (below this uses debug)
    info_threshold_ms: u64,
    /// Minimum duration to log at warn level (for slow operations)
    warn_threshold_ms: u64,
}

impl TimingGuard {
    /// Create a new timing guard.
    ///
    /// The duration will be logged when the guard is dropped.
    pub fn new(operation_type: &'static str, operation_name: impl Into<String>) -> Self {
        let operation_name = operation_name.into();
        debug!(
            operation_type = operation_type,
            operation_name = %operation_name,
            "Starting operation"
        );
        Self {
            operation_type,
            operation_name,
            start: Instant::now(),
            info_threshold_ms: 500,
            warn_threshold_ms: 30_000,
        }
    }

    /// Create a timing guard for a working tree walk.
    pub fn collect(root: impl Into<String>) -> Self {
        Self::new("collect", root)
    }

    /// Create a timing guard for archive creation.
    pub fn archive(id: impl Into<String>) -> Self {
        Self::new("archive", id)
    }

    /// Create a timing guard for archive extraction.
    pub fn extract(id: impl Into<String>) -> Self {
        Self::new("extract", id)
    }

    /// Set the threshold for info-level logging (in milliseconds).
    pub fn with_info_threshold(mut self, ms: u64) -> Self {
        self.info_threshold_ms = ms;
        self
    }

    /// Set the threshold for warn-level logging (in milliseconds).
    pub fn with_warn_threshold(mut self, ms: u64) -> Self {
        self.warn_threshold_ms = ms;
        self
    }

    /// Get the elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

/// Render a millisecond duration as `850ms`, `2.35s` or `3m 12.0s`.
pub fn format_duration_ms(duration_ms: u128) -> String {
    if duration_ms < 1000 {
        format!("{duration_ms}ms")
    } else if duration_ms < 60_000 {
        format!("{:.2}s", duration_ms as f64 / 1000.0)
    } else {
        let mins = duration_ms / 60_000;
        let secs = (duration_ms % 60_000) as f64 / 1000.0;
        format!("{mins}m {secs:.1}s")
    }
}

impl Drop for TimingGuard {
    #[allow(clippy::cognitive_complexity)]
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis();
        let duration_str = format_duration_ms(duration_ms);

        if duration_ms >= self.warn_threshold_ms as u128 {
            warn!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms = duration_ms as u64,
                duration = %duration_str,
                "Slow operation completed"
            );
        } else if duration_ms >= self.info_threshold_ms as u128 {
            info!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms = duration_ms as u64,
                duration = %duration_str,
                "Operation completed"
            );
        } else {
            debug!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms = duration_ms as u64,
                duration = %duration_str,
                "Operation completed"
            );
        }
    }
}
