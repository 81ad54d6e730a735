//! Simple metrics collection for observability
//!
//! Lightweight atomic counters, incremented in the hot path with relaxed
//! ordering and read out as a JSON snapshot on `/metrics`.

use bruteguard::Decision;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Core metrics collected by the server
pub struct Metrics {
    /// Server start time
    start_time: Instant,

    /// Throttle decisions
    pub checks_allowed: AtomicU64,
    pub checks_delayed: AtomicU64,
    pub checks_rejected: AtomicU64,
    pub check_errors: AtomicU64,

    /// Reset operations
    pub resets: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            checks_allowed: AtomicU64::new(0),
            checks_delayed: AtomicU64::new(0),
            checks_rejected: AtomicU64::new(0),
            check_errors: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        }
    }

    /// Record the outcome of one check
    pub fn record_decision(&self, decision: &Decision) {
        match decision {
            Decision::Allow => self.checks_allowed.fetch_add(1, Ordering::Relaxed),
            Decision::AllowAfter(_) => self.checks_delayed.fetch_add(1, Ordering::Relaxed),
            Decision::Reject { .. } => self.checks_rejected.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a failed check or reset
    pub fn record_error(&self) {
        self.check_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reset
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters at one point in time
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            checks_allowed: self.checks_allowed.load(Ordering::Relaxed),
            checks_delayed: self.checks_delayed.load(Ordering::Relaxed),
            checks_rejected: self.checks_rejected.load(Ordering::Relaxed),
            check_errors: self.check_errors.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub checks_allowed: u64,
    pub checks_delayed: u64,
    pub checks_rejected: u64,
    pub check_errors: u64,
    pub resets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn decisions_hit_the_right_counter() {
        let metrics = Metrics::new();
        metrics.record_decision(&Decision::Allow);
        metrics.record_decision(&Decision::Allow);
        metrics.record_decision(&Decision::AllowAfter(Duration::from_millis(100)));
        metrics.record_decision(&Decision::Reject {
            retry_after: Duration::from_secs(360),
        });
        metrics.record_error();
        metrics.record_reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks_allowed, 2);
        assert_eq!(snapshot.checks_delayed, 1);
        assert_eq!(snapshot.checks_rejected, 1);
        assert_eq!(snapshot.check_errors, 1);
        assert_eq!(snapshot.resets, 1);
    }
}
