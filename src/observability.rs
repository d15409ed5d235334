//! Engine metrics counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording dispatcher counters
#[derive(Debug, Default)]
pub struct Metrics {
    jobs_submitted: AtomicU64,
    jobs_rejected: AtomicU64,
    jobs_completed: AtomicU64,
    callback_failures: AtomicU64,
    jobs_abandoned: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_submitted", "Metric incremented");
    }

    pub fn job_rejected(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_rejected", "Metric incremented");
    }

    pub fn job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_completed", "Metric incremented");
    }

    pub fn callback_failed(&self) {
        self.callback_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "callback_failures", "Metric incremented");
    }

    pub fn jobs_abandoned(&self, count: u64) {
        self.jobs_abandoned.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_abandoned", count, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_rejected: self.jobs_rejected.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            jobs_abandoned: self.jobs_abandoned.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub jobs_submitted: u64,
    pub jobs_rejected: u64,
    pub jobs_completed: u64,
    pub callback_failures: u64,
    pub jobs_abandoned: u64,
}
