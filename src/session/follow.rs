//! FOLLOW session: trace a moving target smoothly
//!
//! On top of the jitter tracker this keeps a jerk chain, the distance to
//! the target (informational, never penalized) and running path lengths
//! for the wobble ratio computed at the end.

use super::state::{Lifecycle, SessionMode, SessionState};
use super::summary::{round_to, FollowDetails, MetricsSnapshot, ModeDetails, SessionSummary};
use crate::config::{seconds_or, FollowConfig, FollowScoring, JitterConfig};
use crate::metrics::geometry::{distance, mean, percentile, Point};
use crate::metrics::jitter::JitterTracker;
use crate::metrics::kinematics::{DerivativeChain, WobbleAccumulator};
use crate::metrics::rolling::{RollingWindow, DEFAULT_ROLLING_HORIZON};
use chrono::Utc;
use std::time::Instant;

/// Inputs to the blended movement quality score
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendInputs {
    pub p95_jitter: f64,
    pub p95_jerk: f64,
    pub wobble: f64,
}

/// `100 * clamp(1 - badness / 2, 0, 1)` over reference-normalized p95 jitter, p95 jerk and wobble
pub fn blended_score(inputs: BlendInputs, config: &FollowConfig) -> f64 {
    let jitter_norm = (inputs.p95_jitter / config.jitter_ref).min(2.0);
    let jerk_norm = (inputs.p95_jerk / config.jerk_ref).min(2.0);
    let wobble_norm = (inputs.wobble / config.wobble_ref).min(2.0);

    let badness = 0.45 * jitter_norm + 0.45 * jerk_norm + 0.10 * wobble_norm;
    100.0 * (1.0 - badness / 2.0).clamp(0.0, 1.0)
}

#[derive(Clone, Debug)]
pub struct FollowSession {
    config: FollowConfig,
    lifecycle: Lifecycle,
    tracker: JitterTracker,
    chain: DerivativeChain,
    rolling_jerk: RollingWindow,
    path: WobbleAccumulator,
    target_errors: Vec<f64>,
    last_position: Option<Point>,
    last_target: Option<Point>,
    beat_count: u64,
    bpm: u32,
    wobble: f64,
    summary: Option<SessionSummary>,
}

impl FollowSession {
    /// `dt` is the nominal tick interval used for the derivatives
    pub fn new(config: FollowConfig, jitter: JitterConfig, dt: f64) -> Self {
        let rolling_jerk = RollingWindow::new(
            jitter.rolling_frames,
            seconds_or(jitter.rolling_seconds, DEFAULT_ROLLING_HORIZON),
        );
        FollowSession {
            lifecycle: Lifecycle::new(config.duration_s),
            tracker: JitterTracker::new(jitter.clone()),
            chain: DerivativeChain::new(dt),
            rolling_jerk,
            path: WobbleAccumulator::new(jitter.smoothing_window),
            target_errors: Vec::new(),
            last_position: None,
            last_target: None,
            beat_count: 0,
            bpm: config.default_bpm,
            wobble: 0.0,
            summary: None,
            config,
        }
    }

    /// Begin a fresh session at the given tempo
    pub fn start(&mut self, now: Instant, bpm: u32) {
        self.tracker.reset();
        self.chain.reset();
        self.rolling_jerk.clear();
        self.path.reset();
        self.target_errors.clear();
        self.last_position = None;
        self.last_target = None;
        self.beat_count = 0;
        self.bpm = bpm;
        self.wobble = 0.0;
        self.summary = None;
        self.lifecycle.start(now);
        tracing::info!(
            duration_s = self.config.duration_s,
            bpm,
            path = ?self.config.path_style,
            "FOLLOW session started"
        );
    }

    pub fn stop(&mut self) {
        if self.lifecycle.is_active() {
            tracing::info!(
                elapsed_s = self.lifecycle.elapsed_time(),
                "FOLLOW session stopped early"
            );
        }
        self.lifecycle.stop();
        self.summary = None;
    }

    /// Feed one frame; returns the summary on the frame that completes the session
    pub fn update(
        &mut self,
        position: Option<Point>,
        target: Option<Point>,
        beat_count: u64,
        now: Instant,
    ) -> Option<&SessionSummary> {
        if !self.lifecycle.is_active() {
            return None;
        }

        self.last_position = position;
        self.last_target = target;
        self.beat_count = beat_count;
        self.tracker.update(position, now);

        if let Some(p) = position {
            self.path.push(p);
            if let Some(jerk) = self.chain.push(p) {
                self.rolling_jerk.push(jerk, now);
            }
            if let Some(t) = target {
                self.target_errors.push(distance(p, t));
            }
        }

        if self.lifecycle.advance(now) {
            self.wobble = self.path.ratio();
            let summary = self.build_summary();
            tracing::info!(
                movement_quality_score = summary.score(),
                wobble = self.wobble,
                frames = summary.frames_total,
                "FOLLOW session complete"
            );
            self.summary = Some(summary);
            return self.summary.as_ref();
        }
        None
    }

    /// Movement quality under the configured profile
    ///
    /// The wobble term is only known once the session completes; before
    /// that it contributes 0.
    pub fn movement_quality_score(&self) -> f64 {
        match self.config.scoring {
            FollowScoring::LateralOnly => self.tracker.lateral_jitter_score(),
            FollowScoring::Blended => blended_score(
                BlendInputs {
                    p95_jitter: self.tracker.p95_jitter(),
                    p95_jerk: self.rolling_jerk.p95(),
                    wobble: self.wobble,
                },
                &self.config,
            ),
        }
    }

    fn build_summary(&self) -> SessionSummary {
        let stats = self.tracker.summary();
        SessionSummary {
            timestamp: Utc::now(),
            mode: SessionMode::Follow,
            duration_s: self.config.duration_s,
            avg_jitter: round_to(stats.avg_jitter, 2),
            p95_jitter: round_to(stats.p95_jitter, 2),
            details: ModeDetails::Follow(FollowDetails {
                movement_quality_score: round_to(self.movement_quality_score(), 2),
                scoring: self.config.scoring,
                path_style: self.config.path_style,
                avg_lateral_jitter: round_to(stats.avg_lateral_jitter, 2),
                p95_lateral_jitter: round_to(stats.p95_lateral_jitter, 2),
                max_lateral_jitter: round_to(stats.max_lateral_jitter, 2),
                avg_jerk: round_to(self.rolling_jerk.mean(), 2),
                p95_jerk: round_to(self.rolling_jerk.p95(), 2),
                wobble_ratio: round_to(self.wobble, 3),
                avg_target_error: round_to(mean(&self.target_errors), 2),
                p95_target_error: round_to(percentile(&self.target_errors, 95.0), 2),
                beats_total: self.beat_count,
                bpm: self.bpm,
            }),
            frames_total: stats.frames_total,
            frames_marker_found: stats.frames_marker_found,
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

    pub fn final_metrics(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn tracker(&self) -> &JitterTracker {
        &self.tracker
    }

    pub fn current_jerk(&self) -> f64 {
        self.chain.current_jerk()
    }

    pub fn wobble(&self) -> f64 {
        self.wobble
    }

    /// Raw and smoothed path lengths of this session
    pub fn path(&self) -> &WobbleAccumulator {
        &self.path
    }

    pub fn frames_total(&self) -> u32 {
        self.tracker.frames_total()
    }

    pub fn frames_marker_found(&self) -> u32 {
        self.tracker.frames_marker_found()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mode: SessionMode::Follow,
            state: self.lifecycle.state().label(),
            position: self.last_position,
            target: self.last_target,
            jitter: self.tracker.current_jitter(),
            lateral_jitter: self.tracker.current_lateral_jitter(),
            stability: self.tracker.lateral_stability_level(),
            score: self.movement_quality_score(),
            elapsed_s: self.elapsed_time(),
            time_remaining_s: self.time_remaining(),
            beat_count: self.beat_count,
            frames_total: self.frames_total(),
            frames_marker_found: self.frames_marker_found(),
        }
    }
}
