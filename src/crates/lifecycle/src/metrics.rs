use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters backing the two metrics the service exposes: how often a compare
/// request actually finishes, and how retain decisions split across their
/// three possible outcomes.
#[derive(Debug, Default)]
pub struct Metrics {
    compare_requests: AtomicU64,
    compare_completed: AtomicU64,
    retained: AtomicU64,
    deferred: AtomicU64,
    archived: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub compare_requests: u64,
    pub compare_completed: u64,
    pub compare_completion_rate: f64,
    pub retained: u64,
    pub deferred: u64,
    pub archived: u64,
    pub retention_ratio: RetentionRatio,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetentionRatio {
    pub retain: f64,
    pub defer: f64,
    pub archive: f64,
}

impl Metrics {
    pub fn record_compare_request(&self) {
        self.compare_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compare_completed(&self) {
        self.compare_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retained(&self) {
        self.retained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_archived(&self) {
        self.archived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.compare_requests.load(Ordering::Relaxed);
        let completed = self.compare_completed.load(Ordering::Relaxed);
        let retained = self.retained.load(Ordering::Relaxed);
        let deferred = self.deferred.load(Ordering::Relaxed);
        let archived = self.archived.load(Ordering::Relaxed);
        let total_retentions = retained + deferred + archived;

        let rate = |numerator: u64, denominator: u64| {
            if denominator == 0 {
                0.0
            } else {
                numerator as f64 / denominator as f64
            }
        };

        MetricsSnapshot {
            compare_requests: requests,
            compare_completed: completed,
            compare_completion_rate: rate(completed, requests),
            retained,
            deferred,
            archived,
            retention_ratio: RetentionRatio {
                retain: rate(retained, total_retentions),
                defer: rate(deferred, total_retentions),
                archive: rate(archived, total_retentions),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_with_no_activity() {
        let metrics = Metrics::default();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.compare_completion_rate, 0.0);
        assert_eq!(snapshot.retention_ratio.retain, 0.0);
    }

    #[test]
    fn compare_completion_rate_divides_completed_by_requested() {
        let metrics = Metrics::default();
        metrics.record_compare_request();
        metrics.record_compare_request();
        metrics.record_compare_completed();
        let snapshot = metrics.snapshot();
        assert!((snapshot.compare_completion_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn retention_ratio_splits_across_the_three_outcomes() {
        let metrics = Metrics::default();
        metrics.record_retained();
        metrics.record_retained();
        metrics.record_deferred();
        let snapshot = metrics.snapshot();
        assert!((snapshot.retention_ratio.retain - 2.0 / 3.0).abs() < 1e-9);
        assert!((snapshot.retention_ratio.defer - 1.0 / 3.0).abs() < 1e-9);
    }
}
