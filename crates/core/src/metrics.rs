//! Metrics definitions for pagination.
//!
//! Metrics are recorded through the `metrics` facade. They are no-ops until
//! the host application installs a recorder (e.g. a Prometheus exporter).

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!("pages_served_total", "Total number of pages returned");
    describe_counter!(
        "pagination_rejected_total",
        "Total number of pagination requests that failed"
    );
    describe_counter!(
        "page_probes_total",
        "Total number of existence probes issued while assembling page info"
    );
    describe_histogram!(
        "page_fetch_duration_seconds",
        "Time taken to fetch one page in seconds"
    );
}

/// Record a page returned to a caller.
///
/// # Arguments
/// * `direction` - "forward" or "backward"
pub fn record_page_served(direction: &'static str) {
    counter!("pages_served_total", "direction" => direction).increment(1);
}

/// Record a failed pagination request.
///
/// # Arguments
/// * `reason` - Short failure label, see `PaginationError::reason`
pub fn record_rejected(reason: &'static str) {
    counter!("pagination_rejected_total", "reason" => reason).increment(1);
}

/// Record existence probes.
pub fn record_probes(count: u64) {
    counter!("page_probes_total").increment(count);
}

/// Record page fetch duration.
pub fn record_page_fetch_duration(duration_secs: f64) {
    histogram!("page_fetch_duration_seconds").record(duration_secs);
}

/// A timer that records the page fetch duration when dropped.
pub struct PageFetchTimer {
    start: Instant,
}

impl PageFetchTimer {
    /// Start a new timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for PageFetchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PageFetchTimer {
    fn drop(&mut self) {
        record_page_fetch_duration(self.start.elapsed().as_secs_f64());
    }
}
