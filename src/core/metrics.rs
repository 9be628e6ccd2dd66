//! Logger metrics for observability
//!
//! Counters describing what the logger did with each call: dispatched to
//! outputs, rejected by the logger filter chain, or reported back as a
//! delivery failure. Derived loggers share one metrics instance.

use std::sync::atomic::{AtomicU64, Ordering};

/// # Example
///
/// ```
/// use scribe::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_delivery_failure();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.delivery_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the logger filters and were handed to outputs
    dispatched: AtomicU64,

    /// Records rejected by the logger filter chain
    filtered: AtomicU64,

    /// Failures reported by outputs through the error callback
    delivery_failures: AtomicU64,

    /// Subset of delivery failures caused by an output panicking
    output_panics: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            output_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn output_panics(&self) -> u64 {
        self.output_panics.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivery_failure(&self) -> u64 {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_output_panic(&self) -> u64 {
        self.output_panics.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.delivery_failures.store(0, Ordering::Relaxed);
        self.output_panics.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dispatched: AtomicU64::new(self.dispatched()),
            filtered: AtomicU64::new(self.filtered()),
            delivery_failures: AtomicU64::new(self.delivery_failures()),
            output_panics: AtomicU64::new(self.output_panics()),
        }
    }
}
