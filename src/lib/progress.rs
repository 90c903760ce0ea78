//! Progress tracking utilities
//!
//! A thread-safe counter that logs each time it crosses a multiple of its interval.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe progress tracker for logging progress at regular intervals.
///
/// # Example
/// ```
/// use transcoda_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Transcoded frames").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Transcoded frames 250 (complete)"
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker with the default interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Set the logging interval; zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Add `additional` to the count, logging every interval boundary crossed.
    ///
    /// Returns `true` if the new count lies exactly on an interval boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;

        for milestone in (prev / self.interval + 1)..=(new_count / self.interval) {
            info!("{} {}", self.message, milestone * self.interval);
        }
        new_count > 0 && new_count.is_multiple_of(self.interval)
    }

    /// Log the final count unless the last `log_if_needed` already logged it.
    pub fn log_final(&self) {
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.message, count);
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
