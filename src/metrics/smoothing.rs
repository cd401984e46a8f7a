//! Bounded position history with moving-average smoothing
//!
//! Positions are kept most-recent-last and evicted FIFO once the
//! capacity is reached. Eviction never depends on time.

use super::geometry::{distance, Point};
use std::collections::VecDeque;

/// Endpoints closer than this (px) give no usable movement direction
pub const MIN_DIRECTION_SPAN: f64 = 1.0;

/// Fixed-capacity FIFO of recent positions
#[derive(Clone, Debug)]
pub struct SmoothingWindow {
    positions: VecDeque<Point>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create an empty window holding at most `capacity` positions
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SmoothingWindow {
            positions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a position, evicting the oldest one when full
    pub fn push(&mut self, position: Point) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<Point> {
        self.positions.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.positions.iter()
    }

    /// Average of the last `min(k, len)` positions, `None` when empty
    pub fn smoothed(&self, k: usize) -> Option<Point> {
        let take = k.min(self.positions.len());
        if take == 0 {
            return None;
        }

        let sum = self
            .positions
            .iter()
            .rev()
            .take(take)
            .fold(Point::default(), |acc, &p| acc + p);
        let n = take as f64;
        Some(Point::new(sum.x / n, sum.y / n))
    }

    /// Unit vector from the oldest to the newest of the last `n` positions
    ///
    /// `None` with fewer than `n` positions or when the endpoints are
    /// within [`MIN_DIRECTION_SPAN`] of each other.
    pub fn direction(&self, n: usize) -> Option<Point> {
        let len = self.positions.len();
        if n < 2 || len < n {
            return None;
        }

        let oldest = self.positions[len - n];
        let newest = self.positions[len - 1];
        let span = distance(oldest, newest);
        if span < MIN_DIRECTION_SPAN {
            return None;
        }

        let delta = newest - oldest;
        Some(Point::new(delta.x / span, delta.y / span))
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothed_empty() {
        let window = SmoothingWindow::new(10);
        assert!(window.smoothed(10).is_none());
    }

    #[test]
    fn test_smoothed_uses_most_recent() {
        let mut window = SmoothingWindow::new(10);
        for x in [0.0, 10.0, 20.0, 30.0] {
            window.push(Point::new(x, 0.0));
        }
        assert_eq!(window.smoothed(2), Some(Point::new(25.0, 0.0)));
        // k larger than the window averages everything available
        assert_eq!(window.smoothed(50), Some(Point::new(15.0, 0.0)));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = SmoothingWindow::new(3);
        for x in 0..5 {
            window.push(Point::new(x as f64, 0.0));
        }
        assert_eq!(window.len(), 3);
        let xs: Vec<f64> = window.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_direction() {
        let mut window = SmoothingWindow::new(10);
        for i in 0..5 {
            window.push(Point::new(i as f64 * 2.0, 0.0));
        }
        let dir = window.direction(5).unwrap();
        assert!((dir.x - 1.0).abs() < 1e-9);
        assert!(dir.y.abs() < 1e-9);
    }

    #[test]
    fn test_direction_stationary() {
        let mut window = SmoothingWindow::new(10);
        for _ in 0..5 {
            window.push(Point::new(5.0, 5.0));
        }
        assert!(window.direction(5).is_none());
        // Not enough positions yet
        let mut short = SmoothingWindow::new(10);
        short.push(Point::new(0.0, 0.0));
        short.push(Point::new(50.0, 0.0));
        assert!(short.direction(5).is_none());
    }
}
