//! HOLD session: keep the marker still inside a circle
//!
//! Tracks total jitter, the share of frames spent inside the calibrated
//! circle, and produces the tremor score when the timer runs out.

use super::state::{Lifecycle, SessionMode, SessionState};
use super::summary::{round_to, HoldDetails, MetricsSnapshot, ModeDetails, SessionSummary};
use crate::config::{HoldConfig, HoldScoring, JitterConfig};
use crate::metrics::geometry::{point_in_circle, Point};
use crate::metrics::jitter::JitterTracker;
use chrono::Utc;
use std::time::Instant;

/// `0.7 * p95 + 0.3 * avg`, in pixels
pub fn legacy_tremor_score(p95_jitter: f64, avg_jitter: f64) -> f64 {
    0.7 * p95_jitter + 0.3 * avg_jitter
}

#[derive(Clone, Debug)]
pub struct HoldSession {
    config: HoldConfig,
    lifecycle: Lifecycle,
    tracker: JitterTracker,
    frames_inside_circle: u32,
    last_position: Option<Point>,
    summary: Option<SessionSummary>,
}

impl HoldSession {
    pub fn new(config: HoldConfig, jitter: JitterConfig) -> Self {
        HoldSession {
            lifecycle: Lifecycle::new(config.duration_s),
            tracker: JitterTracker::new(jitter),
            frames_inside_circle: 0,
            last_position: None,
            summary: None,
            config,
        }
    }

    /// Begin a fresh session; nothing carries over from the previous one
    pub fn start(&mut self, now: Instant) {
        self.tracker.reset();
        self.frames_inside_circle = 0;
        self.last_position = None;
        self.summary = None;
        self.lifecycle.start(now);
        tracing::info!(duration_s = self.config.duration_s, "HOLD session started");
    }

    /// Abandon the session (or leave the results screen) without a summary
    pub fn stop(&mut self) {
        if self.lifecycle.is_active() {
            tracing::info!(
                elapsed_s = self.lifecycle.elapsed_time(),
                "HOLD session stopped early"
            );
        }
        self.lifecycle.stop();
        self.summary = None;
    }

    /// Feed one frame; returns the summary on the frame that completes the session
    pub fn update(
        &mut self,
        position: Option<Point>,
        circle: Option<(Point, f64)>,
        now: Instant,
    ) -> Option<&SessionSummary> {
        if !self.lifecycle.is_active() {
            return None;
        }

        self.last_position = position;
        if let (Some(p), Some((center, radius))) = (position, circle) {
            if point_in_circle(p, center, radius) {
                self.frames_inside_circle += 1;
            }
        }
        self.tracker.update(position, now);

        if self.lifecycle.advance(now) {
            let summary = self.build_summary();
            tracing::info!(
                tremor_score = summary.score(),
                frames = summary.frames_total,
                "HOLD session complete"
            );
            self.summary = Some(summary);
            return self.summary.as_ref();
        }
        None
    }

    fn build_summary(&self) -> SessionSummary {
        let stats = self.tracker.summary();
        SessionSummary {
            timestamp: Utc::now(),
            mode: SessionMode::Hold,
            duration_s: self.config.duration_s,
            avg_jitter: round_to(stats.avg_jitter, 2),
            p95_jitter: round_to(stats.p95_jitter, 2),
            details: ModeDetails::Hold(HoldDetails {
                tremor_score: round_to(self.tremor_score(), 2),
                scoring: self.config.scoring,
                inside_circle_pct: round_to(self.inside_circle_pct(), 2),
                max_jitter: round_to(stats.max_jitter, 2),
            }),
            frames_total: stats.frames_total,
            frames_marker_found: stats.frames_marker_found,
        }
    }

    /// Tremor score under the configured profile
    pub fn tremor_score(&self) -> f64 {
        match self.config.scoring {
            HoldScoring::Normalized => self.tracker.jitter_score(),
            HoldScoring::LegacyPixels => {
                legacy_tremor_score(self.tracker.p95_jitter(), self.tracker.avg_jitter())
            }
        }
    }

    /// Percentage of frames with the marker inside the circle
    pub fn inside_circle_pct(&self) -> f64 {
        let total = self.tracker.frames_total();
        if total == 0 {
            0.0
        } else {
            self.frames_inside_circle as f64 / total as f64 * 100.0
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn elapsed_time(&self) -> f64 {
        self.lifecycle.elapsed_time()
    }

    pub fn time_remaining(&self) -> f64 {
        self.lifecycle.time_remaining()
    }

    /// Summary of the completed session, if the last one ran to the end
    pub fn final_metrics(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn tracker(&self) -> &JitterTracker {
        &self.tracker
    }

    pub fn frames_total(&self) -> u32 {
        self.tracker.frames_total()
    }

    pub fn frames_marker_found(&self) -> u32 {
        self.tracker.frames_marker_found()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mode: SessionMode::Hold,
            state: self.lifecycle.state().label(),
            position: self.last_position,
            target: None,
            jitter: self.tracker.current_jitter(),
            lateral_jitter: self.tracker.current_lateral_jitter(),
            stability: self.tracker.stability_level(),
            score: self.tremor_score(),
            elapsed_s: self.elapsed_time(),
            time_remaining_s: self.time_remaining(),
            beat_count: 0,
            frames_total: self.frames_total(),
            frames_marker_found: self.frames_marker_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(start: Instant, i: u64) -> Instant {
        start + Duration::from_micros(i * 33_334)
    }

    fn session(duration_s: f64) -> HoldSession {
        let config = HoldConfig {
            duration_s,
            ..HoldConfig::default()
        };
        HoldSession::new(config, JitterConfig::default())
    }

    #[test]
    fn test_update_before_start_is_noop() {
        let mut hold = session(10.0);
        let now = Instant::now();
        assert!(hold.update(Some(Point::new(1.0, 1.0)), None, now).is_none());
        assert_eq!(hold.frames_total(), 0);
        assert_eq!(hold.state(), SessionState::Idle);
        assert!(hold.final_metrics().is_none());
    }

    #[test]
    fn test_restart_resets_metrics() {
        let start = Instant::now();
        let mut hold = session(10.0);
        hold.start(start);
        for i in 0..20 {
            let x = if i % 2 == 0 { 10.0 } else { -10.0 };
            hold.update(Some(Point::new(x, 0.0)), None, frame(start, i));
        }
        assert_eq!(hold.frames_total(), 20);

        hold.start(frame(start, 20));
        hold.start(frame(start, 21));
        assert_eq!(hold.frames_total(), 0);
        assert_eq!(hold.frames_marker_found(), 0);
        assert_eq!(hold.tracker().current_jitter(), 0.0);
        assert_eq!(hold.inside_circle_pct(), 0.0);
    }

    #[test]
    fn test_completes_on_crossing_tick() {
        let start = Instant::now();
        let mut hold = session(1.0);
        hold.start(start);

        // 30 frames at 33.334 ms: frame 30 is the first at or past 1 s
        for i in 1..30 {
            assert!(hold.update(Some(Point::new(5.0, 5.0)), None, frame(start, i)).is_none());
            assert!(hold.is_active());
            assert!(hold.final_metrics().is_none());
        }
        let summary = hold.update(Some(Point::new(5.0, 5.0)), None, frame(start, 30));
        assert!(summary.is_some());
        assert!(matches!(hold.state(), SessionState::Complete { .. }));
        assert_eq!(hold.final_metrics().unwrap().frames_total, 30);

        // Ticks after completion change nothing
        hold.update(Some(Point::new(5.0, 5.0)), None, frame(start, 31));
        assert_eq!(hold.frames_total(), 30);
    }

    #[test]
    fn test_missed_frames_counted() {
        let start = Instant::now();
        let mut hold = session(10.0);
        hold.start(start);
        for i in 0..10 {
            let position = if i % 5 == 0 { None } else { Some(Point::new(0.0, 0.0)) };
            hold.update(position, Some((Point::new(0.0, 0.0), 5.0)), frame(start, i));
        }
        assert_eq!(hold.frames_total(), 10);
        assert_eq!(hold.frames_marker_found(), 8);
        assert_eq!(hold.inside_circle_pct(), 80.0);
    }

    #[test]
    fn test_stop_discards_summary() {
        let start = Instant::now();
        let mut hold = session(0.1);
        hold.start(start);
        for i in 0..5 {
            hold.update(Some(Point::new(0.0, 0.0)), None, frame(start, i));
        }
        assert!(hold.final_metrics().is_some());
        hold.stop();
        assert!(hold.final_metrics().is_none());
        assert_eq!(hold.state(), SessionState::Idle);
    }

    #[test]
    fn test_legacy_formula() {
        assert!((legacy_tremor_score(10.0, 5.0) - 8.5).abs() < 1e-12);
    }
}
