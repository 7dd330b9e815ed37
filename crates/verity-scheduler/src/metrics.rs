//! Metrics collection for Scheduler operations

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the scheduling loop, dispatched calls and handles
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    submitted: AtomicU64,
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
    cooldowns: AtomicU64,
    rejected: AtomicU64,
}

impl SchedulerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cooldown(&self) {
        self.cooldowns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            cooldowns: self.cooldowns.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls accepted by `submit`
    pub submitted: u64,

    /// Calls released by the scheduling loop
    pub dispatched: u64,

    /// Calls that eventually succeeded
    pub completed: u64,

    /// Calls that exhausted their retries
    pub failed: u64,

    /// Retry attempts across all calls
    pub retries: u64,

    /// Loop iterations spent waiting on an exhausted budget
    pub cooldowns: u64,

    /// Calls refused at submit because they can never fit the budget
    pub rejected: u64,
}

impl MetricsSnapshot {
    /// Calls dispatched but not yet finished
    pub fn in_flight(&self) -> u64 {
        self.dispatched.saturating_sub(self.completed + self.failed)
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Scheduler Metrics Summary".to_string(),
            "=========================".to_string(),
            format!("Submitted: {}", self.submitted),
            format!("Dispatched: {}", self.dispatched),
            format!("Completed: {}", self.completed),
            format!("Failed: {}", self.failed),
            format!("In flight: {}", self.in_flight()),
            format!("Retries: {}", self.retries),
            format!("Cooldowns: {}", self.cooldowns),
            format!("Rejected: {}", self.rejected),
        ];
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = SchedulerMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_and_snapshot() {
        let metrics = SchedulerMetrics::new();
        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_dispatched();
        metrics.record_dispatched();
        metrics.record_completed();
        metrics.record_retry();
        metrics.record_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.in_flight(), 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.rejected, 1);
    }

    #[test]
    fn test_summary() {
        let metrics = SchedulerMetrics::new();
        metrics.record_submitted();
        metrics.record_dispatched();
        metrics.record_failed();
        metrics.record_cooldown();

        let summary = metrics.snapshot().summary();
        assert!(summary.contains("Submitted: 1"));
        assert!(summary.contains("Failed: 1"));
        assert!(summary.contains("In flight: 0"));
        assert!(summary.contains("Cooldowns: 1"));
    }
}
