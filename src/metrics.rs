//! Prometheus metrics for saves and weather proxying.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

use crate::vcs::CommitOutcome;

// === Metric Name Constants ===

/// Completed saves, labelled by commit outcome.
pub const METRIC_SAVES: &str = "saves_total";
/// Rejected saves, labelled by reason.
pub const METRIC_SAVES_REJECTED: &str = "saves_rejected_total";
/// Saves that skipped the optimistic-lock check.
pub const METRIC_SAVES_LOCK_SKIPPED: &str = "saves_lock_skipped_total";
/// Failed git operations.
pub const METRIC_GIT_FAILURES: &str = "git_failures_total";
/// Weather proxy requests, labelled by outcome.
pub const METRIC_WEATHER_REQUESTS: &str = "weather_requests_total";
/// End-to-end save latency.
pub const METRIC_SAVE_LATENCY: &str = "save_latency_ms";
/// Upstream weather latency.
pub const METRIC_WEATHER_LATENCY: &str = "weather_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_SAVES, "Total number of successful saves");
    describe_counter!(METRIC_SAVES_REJECTED, "Total number of rejected saves");
    describe_counter!(
        METRIC_SAVES_LOCK_SKIPPED,
        "Saves that proceeded because the current document had no readable lock marker"
    );
    describe_counter!(METRIC_GIT_FAILURES, "Total number of failed git operations");
    describe_counter!(METRIC_WEATHER_REQUESTS, "Total number of weather proxy requests");
    describe_histogram!(METRIC_SAVE_LATENCY, "Save latency in milliseconds");
    describe_histogram!(
        METRIC_WEATHER_LATENCY,
        "Upstream weather request latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Increment the successful save counter.
pub fn inc_saves(outcome: CommitOutcome) {
    counter!(METRIC_SAVES, "outcome" => outcome.as_ref().to_string()).increment(1);
}

/// Increment the rejected save counter.
pub fn inc_saves_rejected(reason: &'static str) {
    counter!(METRIC_SAVES_REJECTED, "reason" => reason).increment(1);
}

/// Increment the lock-skipped counter.
pub fn inc_saves_lock_skipped() {
    counter!(METRIC_SAVES_LOCK_SKIPPED).increment(1);
}

/// Increment the git failure counter.
pub fn inc_git_failures() {
    counter!(METRIC_GIT_FAILURES).increment(1);
}

/// Increment the weather request counter.
pub fn inc_weather_requests(outcome: &'static str) {
    counter!(METRIC_WEATHER_REQUESTS, "outcome" => outcome).increment(1);
}

/// Record weather upstream latency.
pub fn record_weather_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_WEATHER_LATENCY).record(latency_ms);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a save.
pub fn timer_save() -> LatencyTimer {
    LatencyTimer::new(METRIC_SAVE_LATENCY)
}
