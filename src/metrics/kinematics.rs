//! Movement smoothness: finite-difference jerk and path wobble
//!
//! Velocity, acceleration and jerk are successive differences of the
//! detected positions divided by the fixed tick interval. Each order needs
//! two values of the order below it; until then jerk reads 0.

use super::geometry::{distance, Point};
use super::smoothing::SmoothingWindow;

/// Added to the raw path length so a motionless session cannot divide by zero
pub const WOBBLE_EPSILON: f64 = 1e-6;

/// Third-derivative estimator over consecutive detections
#[derive(Clone, Debug)]
pub struct DerivativeChain {
    dt: f64,
    last_position: Option<Point>,
    last_velocity: Option<Point>,
    last_acceleration: Option<Point>,
    current_jerk: f64,
}

impl DerivativeChain {
    /// Create a chain sampling every `dt` seconds
    pub fn new(dt: f64) -> Self {
        DerivativeChain {
            dt,
            last_position: None,
            last_velocity: None,
            last_acceleration: None,
            current_jerk: 0.0,
        }
    }

    /// Push a detected position; returns the jerk magnitude once available
    pub fn push(&mut self, position: Point) -> Option<f64> {
        let inv_dt = 1.0 / self.dt;
        let mut jerk = None;

        if let Some(prev_pos) = self.last_position {
            let velocity = (position - prev_pos) * inv_dt;
            if let Some(prev_vel) = self.last_velocity {
                let acceleration = (velocity - prev_vel) * inv_dt;
                if let Some(prev_acc) = self.last_acceleration {
                    let magnitude = ((acceleration - prev_acc) * inv_dt).norm();
                    self.current_jerk = magnitude;
                    jerk = Some(magnitude);
                }
                self.last_acceleration = Some(acceleration);
            }
            self.last_velocity = Some(velocity);
        }
        self.last_position = Some(position);

        jerk
    }

    pub fn current_jerk(&self) -> f64 {
        self.current_jerk
    }

    /// Latest velocity estimate, px/s
    pub fn velocity(&self) -> Option<Point> {
        self.last_velocity
    }

    pub fn reset(&mut self) {
        *self = DerivativeChain::new(self.dt);
    }
}

/// Total length of the polyline through `points`
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Running raw and smoothed path lengths over a whole session
///
/// Point `i` of the smoothed path averages raw points `i - window ..= i`
/// (clamped at the start). Only the last `window + 1` raw points are
/// kept, so the lengths cover every point ever pushed.
#[derive(Clone, Debug)]
pub struct WobbleAccumulator {
    local: SmoothingWindow,
    last_raw: Option<Point>,
    last_smoothed: Option<Point>,
    raw_length: f64,
    smooth_length: f64,
    points: usize,
}

impl WobbleAccumulator {
    pub fn new(window: usize) -> Self {
        WobbleAccumulator {
            local: SmoothingWindow::new(window + 1),
            last_raw: None,
            last_smoothed: None,
            raw_length: 0.0,
            smooth_length: 0.0,
            points: 0,
        }
    }

    pub fn push(&mut self, position: Point) {
        if let Some(prev) = self.last_raw {
            self.raw_length += distance(prev, position);
        }
        self.last_raw = Some(position);

        self.local.push(position);
        if let Some(smoothed) = self.local.smoothed(self.local.capacity()) {
            if let Some(prev) = self.last_smoothed {
                self.smooth_length += distance(prev, smoothed);
            }
            self.last_smoothed = Some(smoothed);
        }
        self.points += 1;
    }

    pub fn raw_length(&self) -> f64 {
        self.raw_length
    }

    pub fn smooth_length(&self) -> f64 {
        self.smooth_length
    }

    /// Number of positions pushed since the last reset
    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Fractional excess length of the raw path over the smoothed one
    ///
    /// 0 for fewer than two points or a motionless path.
    pub fn ratio(&self) -> f64 {
        if self.points < 2 || self.raw_length <= 0.0 {
            return 0.0;
        }
        ((self.raw_length - self.smooth_length) / (self.raw_length + WOBBLE_EPSILON)).max(0.0)
    }

    pub fn reset(&mut self) {
        *self = WobbleAccumulator::new(self.local.capacity() - 1);
    }
}

/// Wobble ratio of a complete raw path, see [`WobbleAccumulator`]
pub fn wobble_ratio(points: &[Point], window: usize) -> f64 {
    let mut wobble = WobbleAccumulator::new(window);
    for &p in points {
        wobble.push(p);
    }
    wobble.ratio()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jerk_needs_four_positions() {
        let mut chain = DerivativeChain::new(1.0);
        assert_eq!(chain.push(Point::new(0.0, 0.0)), None);
        assert_eq!(chain.push(Point::new(1.0, 0.0)), None);
        assert_eq!(chain.push(Point::new(2.0, 0.0)), None);
        assert_eq!(chain.current_jerk(), 0.0);
        // Constant velocity: zero jerk once defined
        assert_eq!(chain.push(Point::new(3.0, 0.0)), Some(0.0));
    }

    #[test]
    fn test_jerk_magnitude() {
        // x = t^3 with dt = 1 has a constant third difference of 6
        let mut chain = DerivativeChain::new(1.0);
        let mut last = None;
        for t in 0..6 {
            let x = (t * t * t) as f64;
            last = chain.push(Point::new(x, 0.0));
        }
        assert!((last.unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_jerk_scales_with_dt() {
        let dt = 1.0 / 30.0;
        let mut chain = DerivativeChain::new(dt);
        for x in [0.0, 0.0, 0.0, 1.0] {
            chain.push(Point::new(x, 0.0));
        }
        assert!((chain.current_jerk() - 1.0 / (dt * dt * dt)).abs() < 1e-6);
    }

    #[test]
    fn test_wobble_straight_line_is_small() {
        let points: Vec<Point> = (0..100).map(|i| Point::new(i as f64, 0.0)).collect();
        let wobble = wobble_ratio(&points, 10);
        // Smoothed path lags by a few pixels at the end only
        assert!(wobble >= 0.0);
        assert!(wobble < 0.1);
    }

    #[test]
    fn test_wobble_zigzag_is_large() {
        let points: Vec<Point> = (0..100)
            .map(|i| Point::new(i as f64, if i % 2 == 0 { 5.0 } else { -5.0 }))
            .collect();
        assert!(wobble_ratio(&points, 10) > 0.5);
    }

    #[test]
    fn test_wobble_accumulator_keeps_whole_path() {
        // Zig-zag first, then a long straight stretch well past the smoothing window
        let mut wobble = WobbleAccumulator::new(10);
        for i in 0..900 {
            let y = if i < 300 && i % 2 == 0 { 8.0 } else if i < 300 { -8.0 } else { 0.0 };
            wobble.push(Point::new(i as f64 * 2.0, y));
        }
        assert_eq!(wobble.len(), 900);
        assert!(wobble.raw_length() > 5_900.0);
        assert!(wobble.ratio() > 0.5);

        wobble.reset();
        assert!(wobble.is_empty());
        assert_eq!(wobble.raw_length(), 0.0);
        assert_eq!(wobble.ratio(), 0.0);
    }

    #[test]
    fn test_wobble_degenerate() {
        assert_eq!(wobble_ratio(&[], 10), 0.0);
        assert_eq!(wobble_ratio(&[Point::new(1.0, 1.0)], 10), 0.0);
        let still = vec![Point::new(3.0, 3.0); 20];
        assert_eq!(wobble_ratio(&still, 10), 0.0);
    }
}
