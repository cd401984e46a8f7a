//! Marker position sources
//!
//! Features:
//! - `MarkerTracker` trait: one position (or none) per frame
//! - Terminal pointer tracker fed by mouse events
//! - Seeded simulated hand with tremor noise and dropouts
//! - Mapping between terminal cells and frame pixels

use crate::metrics::geometry::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Anything that can locate the marker once per frame
pub trait MarkerTracker {
    /// Marker position in frame pixels, or `None` when not detected
    fn detect(&mut self, now: Instant) -> Option<Point>;
}

/// Last known terminal pointer position, already in frame pixels
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    position: Option<Point>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }

    /// Pointer left the window
    pub fn clear(&mut self) {
        self.position = None;
    }
}

impl MarkerTracker for PointerTracker {
    fn detect(&mut self, _now: Instant) -> Option<Point> {
        self.position
    }
}

/// Tunables for [`SimulatedHand`]
#[derive(Clone, Debug, PartialEq)]
pub struct HandProfile {
    /// Peak tremor displacement per frame, px
    pub tremor_px: f64,
    /// Fraction of the remaining distance to the aim covered each frame
    pub follow_gain: f64,
    /// Probability that a frame loses the marker
    pub dropout: f64,
}

impl Default for HandProfile {
    fn default() -> Self {
        HandProfile {
            tremor_px: 2.0,
            follow_gain: 0.35,
            dropout: 0.02,
        }
    }
}

/// A noisy hand chasing an aim point, reproducible from its seed
#[derive(Clone, Debug)]
pub struct SimulatedHand {
    rng: StdRng,
    profile: HandProfile,
    position: Point,
    aim: Point,
}

impl SimulatedHand {
    pub fn new(seed: u64, start: Point, profile: HandProfile) -> Self {
        SimulatedHand {
            rng: StdRng::seed_from_u64(seed),
            profile,
            position: start,
            aim: start,
        }
    }

    /// Where the hand is trying to be this frame
    pub fn aim_at(&mut self, aim: Point) {
        self.aim = aim;
    }

    pub fn position(&self) -> Point {
        self.position
    }
}

impl MarkerTracker for SimulatedHand {
    fn detect(&mut self, _now: Instant) -> Option<Point> {
        let step = (self.aim - self.position) * self.profile.follow_gain;
        let amp = self.profile.tremor_px;
        let noise = if amp > 0.0 {
            Point::new(
                self.rng.gen_range(-amp..=amp),
                self.rng.gen_range(-amp..=amp),
            )
        } else {
            Point::default()
        };
        self.position = self.position + step + noise;

        if self.profile.dropout > 0.0 && self.rng.gen_bool(self.profile.dropout.min(1.0)) {
            return None;
        }
        Some(self.position)
    }
}

/// Scale between a terminal grid and the tracked frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenMapping {
    pub cols: u16,
    pub rows: u16,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl ScreenMapping {
    pub fn new(cols: u16, rows: u16, frame_width: u32, frame_height: u32) -> Self {
        ScreenMapping {
            cols: cols.max(1),
            rows: rows.max(1),
            frame_width,
            frame_height,
        }
    }

    /// Center of a terminal cell in frame pixels
    pub fn to_frame(&self, col: u16, row: u16) -> Point {
        let cell_w = self.frame_width as f64 / self.cols as f64;
        let cell_h = self.frame_height as f64 / self.rows as f64;
        Point::new(
            (col as f64 + 0.5) * cell_w,
            (row as f64 + 0.5) * cell_h,
        )
    }

    /// Terminal cell containing a frame point, clamped to the grid
    pub fn to_cell(&self, point: Point) -> (u16, u16) {
        let cell_w = self.frame_width as f64 / self.cols as f64;
        let cell_h = self.frame_height as f64 / self.rows as f64;
        let col = (point.x / cell_w).floor().clamp(0.0, (self.cols - 1) as f64);
        let row = (point.y / cell_h).floor().clamp(0.0, (self.rows - 1) as f64);
        (col as u16, row as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::geometry::distance;

    #[test]
    fn test_pointer_tracker() {
        let mut tracker = PointerTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.detect(now), None);
        tracker.set_position(Point::new(3.0, 4.0));
        assert_eq!(tracker.detect(now), Some(Point::new(3.0, 4.0)));
        tracker.clear();
        assert_eq!(tracker.detect(now), None);
    }

    #[test]
    fn test_simulated_hand_is_reproducible() {
        let now = Instant::now();
        let mut a = SimulatedHand::new(7, Point::new(0.0, 0.0), HandProfile::default());
        let mut b = SimulatedHand::new(7, Point::new(0.0, 0.0), HandProfile::default());
        for _ in 0..50 {
            assert_eq!(a.detect(now), b.detect(now));
        }
    }

    #[test]
    fn test_simulated_hand_converges_on_aim() {
        let profile = HandProfile {
            tremor_px: 1.0,
            follow_gain: 0.5,
            dropout: 0.0,
        };
        let mut hand = SimulatedHand::new(1, Point::new(0.0, 0.0), profile);
        hand.aim_at(Point::new(100.0, 50.0));
        let now = Instant::now();
        for _ in 0..60 {
            assert!(hand.detect(now).is_some());
        }
        // Steady-state error is bounded by the tremor amplitude
        assert!(distance(hand.position(), Point::new(100.0, 50.0)) < 3.0);
    }

    #[test]
    fn test_screen_mapping() {
        let mapping = ScreenMapping::new(80, 24, 640, 480);
        assert_eq!(mapping.to_frame(0, 0), Point::new(4.0, 10.0));
        assert_eq!(mapping.to_cell(Point::new(4.0, 10.0)), (0, 0));
        assert_eq!(mapping.to_cell(Point::new(639.0, 479.0)), (79, 23));
        assert_eq!(mapping.to_cell(Point::new(-50.0, 900.0)), (0, 23));
    }
}
