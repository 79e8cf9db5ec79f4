//! Sliding-window rate limiter, one window per session id.
//!
//! A `DashMap` keyed by session id, each entry guarding its own deque of
//! recent request timestamps with an inner lock: requests are counted in the
//! trailing window rather than smoothed over a refill rate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    entries: DashMap<Uuid, Mutex<VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window, entries: DashMap::new() }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records one request for `key` and reports whether it's within the
    /// limit. Prunes timestamps older than the window before counting, so
    /// a session that goes quiet for a while doesn't carry stale history.
    pub fn check(&self, key: Uuid) -> bool {
        let entry = self.entries.entry(key).or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut timestamps = entry.lock().unwrap();
        let now = Instant::now();

        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.limit {
            return false;
        }
        timestamps.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        let key = Uuid::new_v4();
        assert!(limiter.check(key));
        assert!(limiter.check(key));
        assert!(limiter.check(key));
        assert!(!limiter.check(key));
    }

    #[test]
    fn sessions_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(limiter.check(a));
        assert!(limiter.check(b));
        assert!(!limiter.check(a));
    }

    #[test]
    fn an_expired_window_frees_up_capacity() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_millis(20));
        let key = Uuid::new_v4();
        assert!(limiter.check(key));
        assert!(!limiter.check(key));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check(key));
    }
}
