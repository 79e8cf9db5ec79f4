use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters behind the rehydration hit-rate / average-selection
/// metrics. Process-wide: every call to [`crate::rehydrate`] updates the
/// same counters regardless of session.
#[derive(Debug, Default)]
pub struct RehydrationMetrics {
    runs: AtomicU64,
    runs_with_hit: AtomicU64,
    candidates_selected: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct RehydrationMetricsSnapshot {
    pub runs: u64,
    pub hit_rate: f64,
    pub avg_selected: f64,
}

impl RehydrationMetrics {
    pub fn record_run(&self, selected_count: usize) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.candidates_selected.fetch_add(selected_count as u64, Ordering::Relaxed);
        if selected_count > 0 {
            self.runs_with_hit.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RehydrationMetricsSnapshot {
        let runs = self.runs.load(Ordering::Relaxed);
        let hits = self.runs_with_hit.load(Ordering::Relaxed);
        let selected = self.candidates_selected.load(Ordering::Relaxed);
        RehydrationMetricsSnapshot {
            runs,
            hit_rate: if runs == 0 { 0.0 } else { hits as f64 / runs as f64 },
            avg_selected: if runs == 0 { 0.0 } else { selected as f64 / runs as f64 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_and_average_reflect_recorded_runs() {
        let metrics = RehydrationMetrics::default();
        metrics.record_run(4);
        metrics.record_run(0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs, 2);
        assert!((snapshot.hit_rate - 0.5).abs() < 1e-9);
        assert!((snapshot.avg_selected - 2.0).abs() < 1e-9);
    }
}
