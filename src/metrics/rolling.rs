//! Rolling window of scalar metric values
//!
//! Bounded both by entry count and by a time horizon measured from the
//! newest entry. Mean and p95 are recomputed by sorting on every push;
//! the window never holds more than about a second of frames.

use super::geometry::{mean, percentile};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Age limit used when the configured one is unusable
pub const DEFAULT_ROLLING_HORIZON: Duration = Duration::from_secs(1);

/// Rolling statistics of a metric (jitter, lateral jitter, jerk)
#[derive(Clone, Debug)]
pub struct RollingWindow {
    entries: VecDeque<(Instant, f64)>,
    max_len: usize,
    horizon: Duration,
    mean: f64,
    p95: f64,
}

impl RollingWindow {
    /// Create a window capped at `max_len` entries and `horizon` of age
    pub fn new(max_len: usize, horizon: Duration) -> Self {
        let max_len = max_len.max(1);
        RollingWindow {
            entries: VecDeque::with_capacity(max_len),
            max_len,
            horizon,
            mean: 0.0,
            p95: 0.0,
        }
    }

    /// Add a value observed at `now` and refresh mean/p95
    pub fn push(&mut self, value: f64, now: Instant) {
        self.entries.push_back((now, value));
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
        while let Some(&(at, _)) = self.entries.front() {
            if now.saturating_duration_since(at) > self.horizon {
                self.entries.pop_front();
            } else {
                break;
            }
        }

        let values = self.values();
        self.mean = mean(&values);
        self.p95 = percentile(&values, 95.0);
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|&(_, v)| v).collect()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn p95(&self) -> f64 {
        self.p95
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.mean = 0.0;
        self.p95 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_bound() {
        let start = Instant::now();
        let mut window = RollingWindow::new(3, Duration::from_secs(10));
        for i in 0..5 {
            window.push(i as f64, start + Duration::from_millis(i * 10));
        }
        assert_eq!(window.values(), vec![2.0, 3.0, 4.0]);
        assert!((window.mean() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_bound() {
        let start = Instant::now();
        let mut window = RollingWindow::new(100, Duration::from_secs(1));
        window.push(50.0, start);
        window.push(1.0, start + Duration::from_millis(500));
        window.push(1.0, start + Duration::from_millis(1200));
        // The first value is older than one second relative to the newest
        assert_eq!(window.len(), 2);
        assert_eq!(window.p95(), 1.0);
    }

    #[test]
    fn test_clear() {
        let mut window = RollingWindow::new(30, Duration::from_secs(1));
        window.push(4.0, Instant::now());
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.mean(), 0.0);
        assert_eq!(window.p95(), 0.0);
    }
}
