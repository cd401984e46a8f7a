//! Jitter tracking: deviation of the marker from its recent trend
//!
//! Jitter is the distance between the current position and the moving
//! average of the last `smoothing_window` positions. Lateral jitter keeps
//! only the part of that deviation perpendicular to the direction of
//! travel, so deliberate movement along a path is not counted as tremor.

use super::geometry::{distance, percentile, Point};
use super::rolling::{RollingWindow, DEFAULT_ROLLING_HORIZON};
use super::smoothing::SmoothingWindow;
use crate::config::{seconds_or, JitterConfig};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Three-way classification of the current jitter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityLevel {
    Stable,
    Warning,
    Unstable,
}

impl StabilityLevel {
    /// Classify a value; values equal to a threshold land in the safer bucket
    pub fn classify(value: f64, stable: f64, warning: f64) -> Self {
        if value <= stable {
            StabilityLevel::Stable
        } else if value <= warning {
            StabilityLevel::Warning
        } else {
            StabilityLevel::Unstable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityLevel::Stable => "stable",
            StabilityLevel::Warning => "warning",
            StabilityLevel::Unstable => "unstable",
        }
    }
}

/// Linear inverse mapping of a p95 value onto 0-100
pub fn inverse_score(p95: f64, stable_ref: f64, max_ref: f64) -> f64 {
    let span = max_ref - stable_ref;
    if span <= 0.0 {
        return if p95 <= stable_ref { 100.0 } else { 0.0 };
    }
    100.0 * (1.0 - ((p95 - stable_ref) / span).clamp(0.0, 1.0))
}

/// Per-tick jitter accumulator
#[derive(Clone, Debug)]
pub struct JitterTracker {
    config: JitterConfig,
    window: SmoothingWindow,
    /// Every jitter value of the session, for the final score
    jitter_history: Vec<f64>,
    lateral_history: Vec<f64>,
    rolling_jitter: RollingWindow,
    rolling_lateral: RollingWindow,
    current_jitter: f64,
    current_lateral_jitter: f64,
    frames_total: u32,
    frames_marker_found: u32,
}

impl JitterTracker {
    pub fn new(config: JitterConfig) -> Self {
        let capacity = config.smoothing_window.max(config.direction_window);
        let horizon = seconds_or(config.rolling_seconds, DEFAULT_ROLLING_HORIZON);
        JitterTracker {
            window: SmoothingWindow::new(capacity),
            jitter_history: Vec::new(),
            lateral_history: Vec::new(),
            rolling_jitter: RollingWindow::new(config.rolling_frames, horizon),
            rolling_lateral: RollingWindow::new(config.rolling_frames, horizon),
            current_jitter: 0.0,
            current_lateral_jitter: 0.0,
            frames_total: 0,
            frames_marker_found: 0,
            config,
        }
    }

    /// Feed one tick; returns the instantaneous total jitter
    ///
    /// A missed detection keeps the previous jitter values on display.
    pub fn update(&mut self, position: Option<Point>, now: Instant) -> f64 {
        self.frames_total += 1;
        let Some(position) = position else {
            return self.current_jitter;
        };
        self.frames_marker_found += 1;
        self.window.push(position);

        if self.window.len() < self.config.smoothing_window {
            return 0.0;
        }
        let Some(smoothed) = self.window.smoothed(self.config.smoothing_window) else {
            return 0.0;
        };

        let jitter = distance(position, smoothed);
        let lateral = self.lateral_component(position, smoothed);

        self.current_jitter = jitter;
        self.current_lateral_jitter = lateral;
        self.jitter_history.push(jitter);
        self.lateral_history.push(lateral);
        self.rolling_jitter.push(jitter, now);
        self.rolling_lateral.push(lateral, now);

        jitter
    }

    fn lateral_component(&self, position: Point, smoothed: Point) -> f64 {
        let deviation = position - smoothed;
        match self.window.direction(self.config.direction_window) {
            Some(dir) => {
                let forward = deviation.dot(dir);
                (deviation - dir * forward).norm()
            }
            // No clear direction: the whole deviation counts
            None => deviation.norm(),
        }
    }

    pub fn stability_level(&self) -> StabilityLevel {
        StabilityLevel::classify(
            self.current_jitter,
            self.config.stable_threshold,
            self.config.warning_threshold,
        )
    }

    pub fn lateral_stability_level(&self) -> StabilityLevel {
        StabilityLevel::classify(
            self.current_lateral_jitter,
            self.config.lateral_stable_threshold,
            self.config.lateral_warning_threshold,
        )
    }

    /// 0-100 score from the session-long p95 jitter; 100 before any data
    pub fn jitter_score(&self) -> f64 {
        if self.jitter_history.is_empty() {
            return 100.0;
        }
        inverse_score(
            percentile(&self.jitter_history, 95.0),
            self.config.stable_threshold,
            self.config.max_threshold,
        )
    }

    pub fn lateral_jitter_score(&self) -> f64 {
        if self.lateral_history.is_empty() {
            return 100.0;
        }
        inverse_score(
            percentile(&self.lateral_history, 95.0),
            self.config.lateral_stable_threshold,
            self.config.lateral_max_threshold,
        )
    }

    pub fn current_jitter(&self) -> f64 {
        self.current_jitter
    }

    pub fn current_lateral_jitter(&self) -> f64 {
        self.current_lateral_jitter
    }

    /// Rolling (last second) mean jitter
    pub fn avg_jitter(&self) -> f64 {
        self.rolling_jitter.mean()
    }

    pub fn p95_jitter(&self) -> f64 {
        self.rolling_jitter.p95()
    }

    pub fn avg_lateral_jitter(&self) -> f64 {
        self.rolling_lateral.mean()
    }

    pub fn p95_lateral_jitter(&self) -> f64 {
        self.rolling_lateral.p95()
    }

    pub fn max_jitter(&self) -> f64 {
        self.jitter_history.iter().copied().fold(0.0, f64::max)
    }

    pub fn max_lateral_jitter(&self) -> f64 {
        self.lateral_history.iter().copied().fold(0.0, f64::max)
    }

    pub fn lateral_history(&self) -> &[f64] {
        &self.lateral_history
    }

    pub fn frames_total(&self) -> u32 {
        self.frames_total
    }

    pub fn frames_marker_found(&self) -> u32 {
        self.frames_marker_found
    }

    pub fn config(&self) -> &JitterConfig {
        &self.config
    }

    pub fn summary(&self) -> JitterSummary {
        JitterSummary {
            avg_jitter: self.avg_jitter(),
            p95_jitter: self.p95_jitter(),
            max_jitter: self.max_jitter(),
            jitter_score: self.jitter_score(),
            avg_lateral_jitter: self.avg_lateral_jitter(),
            p95_lateral_jitter: self.p95_lateral_jitter(),
            max_lateral_jitter: self.max_lateral_jitter(),
            lateral_jitter_score: self.lateral_jitter_score(),
            frames_total: self.frames_total,
            frames_marker_found: self.frames_marker_found,
        }
    }

    /// Drop all history and counters
    pub fn reset(&mut self) {
        *self = JitterTracker::new(self.config.clone());
    }
}

/// Point-in-time jitter statistics
#[derive(Clone, Debug, PartialEq)]
pub struct JitterSummary {
    pub avg_jitter: f64,
    pub p95_jitter: f64,
    pub max_jitter: f64,
    pub jitter_score: f64,
    pub avg_lateral_jitter: f64,
    pub p95_lateral_jitter: f64,
    pub max_lateral_jitter: f64,
    pub lateral_jitter_score: f64,
    pub frames_total: u32,
    pub frames_marker_found: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tick(start: Instant, i: u64) -> Instant {
        start + Duration::from_micros(i * 33_333)
    }

    #[test]
    fn test_constant_position_converges_to_zero() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for i in 0..40 {
            tracker.update(Some(Point::new(100.0, 100.0)), tick(start, i));
        }
        assert_eq!(tracker.current_jitter(), 0.0);
        assert_eq!(tracker.stability_level(), StabilityLevel::Stable);
        assert_eq!(tracker.jitter_score(), 100.0);
    }

    #[test]
    fn test_alternating_offsets_settle_near_d() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        let d = 4.0;
        for i in 0..60 {
            let offset = if i % 2 == 0 { d } else { -d };
            tracker.update(Some(Point::new(200.0 + offset, 200.0)), tick(start, i));
        }
        // Even-length window of alternating samples averages to the mean exactly
        assert!((tracker.current_jitter() - d).abs() < 1e-9);
    }

    #[test]
    fn test_warmup_reports_zero() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for i in 0..9 {
            let jitter = tracker.update(Some(Point::new(i as f64 * 10.0, 0.0)), tick(start, i));
            assert_eq!(jitter, 0.0);
        }
        assert_eq!(tracker.summary().p95_jitter, 0.0);
    }

    #[test]
    fn test_missing_detection_coasts() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for i in 0..20 {
            let offset = if i % 2 == 0 { 6.0 } else { -6.0 };
            tracker.update(Some(Point::new(offset, 0.0)), tick(start, i));
        }
        let before = tracker.current_jitter();
        let returned = tracker.update(None, tick(start, 20));
        assert_eq!(returned, before);
        assert_eq!(tracker.current_jitter(), before);
        assert_eq!(tracker.frames_total(), 21);
        assert_eq!(tracker.frames_marker_found(), 20);
    }

    #[test]
    fn test_stability_threshold_tie_break() {
        assert_eq!(StabilityLevel::classify(5.0, 5.0, 15.0), StabilityLevel::Stable);
        assert_eq!(StabilityLevel::classify(15.0, 5.0, 15.0), StabilityLevel::Warning);
        assert_eq!(StabilityLevel::classify(15.01, 5.0, 15.0), StabilityLevel::Unstable);
    }

    #[test]
    fn test_inverse_score() {
        assert_eq!(inverse_score(2.0, 5.0, 30.0), 100.0);
        assert_eq!(inverse_score(30.0, 5.0, 30.0), 0.0);
        assert_eq!(inverse_score(45.0, 5.0, 30.0), 0.0);
        assert!((inverse_score(17.5, 5.0, 30.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_motion_has_no_lateral_jitter() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for i in 0..40 {
            tracker.update(Some(Point::new(i as f64 * 3.0, 50.0)), tick(start, i));
        }
        // Lagging average sits behind along the path: total jitter, no lateral
        assert!(tracker.current_jitter() > 10.0);
        assert!(tracker.current_lateral_jitter() < 1e-9);
        assert_eq!(tracker.lateral_jitter_score(), 100.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let start = Instant::now();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for i in 0..30 {
            tracker.update(Some(Point::new((i % 3) as f64 * 20.0, 0.0)), tick(start, i));
        }
        tracker.reset();
        assert_eq!(tracker.frames_total(), 0);
        assert_eq!(tracker.current_jitter(), 0.0);
        assert_eq!(tracker.max_jitter(), 0.0);
        assert_eq!(tracker.jitter_score(), 100.0);
    }
}
