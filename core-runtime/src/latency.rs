//! Scope latency logging.

use std::time::{Duration, Instant};

/// Logs how long a scope took when dropped.
///
/// ```rust
/// use core_runtime::latency::LatencyLogger;
///
/// fn render() {
///     let _latency = LatencyLogger::new("render");
///     // ... work ...
/// }
/// # render();
/// ```
#[must_use = "the latency is measured until the logger is dropped"]
#[derive(Debug)]
pub struct LatencyLogger {
    label: String,
    start: Instant,
}

impl LatencyLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    /// Time since the logger was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyLogger {
    fn drop(&mut self) {
        let latency = self.start.elapsed();
        tracing::info!(
            label = %self.label,
            latency_us = latency.as_micros() as u64,
            "{}: {:?}",
            self.label,
            latency
        );
    }
}
