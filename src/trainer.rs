//! Trainer: application state for one user at one screen
//!
//! Owns the calibration for both modes, the FOLLOW target and metronome,
//! one session per mode, and the optional history store. Every command
//! and every tick arrive on the same thread, so no locking is needed.

use crate::calibration::{CircleCalibration, SegmentCalibration};
use crate::config::{PathStyle, TrainerConfig};
use crate::metrics::geometry::{point_in_rect, point_to_segment_distance, Point};
use crate::session::{
    FollowSession, HoldSession, MetricsSnapshot, SessionMode, SessionState, SessionSummary,
};
use crate::storage::SessionStore;
use crate::target::metronome::{BeatCallback, Metronome};
use crate::target::path::{OrbitPath, TargetPath};
use std::time::Instant;

/// Side of the square drawn around each calibrated endpoint
pub const ENDPOINT_BOX_SIZE: f64 = 40.0;

/// Why a session could not start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartRefusal {
    /// FOLLOW on the linear path needs both endpoints
    EndpointsNotCalibrated,
}

pub struct Trainer {
    config: TrainerConfig,
    mode: SessionMode,
    circle: CircleCalibration,
    segment: SegmentCalibration,
    target_path: Option<TargetPath>,
    metronome: Metronome,
    hold: HoldSession,
    follow: FollowSession,
    store: Option<SessionStore>,
    session_start: Option<Instant>,
    last_position: Option<Point>,
}

impl Trainer {
    /// Build a trainer; an invalid config is logged, and unusable
    /// durations in it fall back to safe values instead of panicking
    pub fn new(config: TrainerConfig) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "trainer config failed validation");
        }
        let hold = HoldSession::new(config.hold.clone(), config.jitter.clone());
        let follow = FollowSession::new(
            config.follow.clone(),
            config.jitter.clone(),
            config.frame_dt(),
        );
        Trainer {
            mode: SessionMode::Hold,
            circle: CircleCalibration::default(),
            segment: SegmentCalibration::default(),
            target_path: None,
            metronome: Metronome::new(config.follow.default_bpm),
            hold,
            follow,
            store: None,
            session_start: None,
            last_position: None,
            config,
        }
    }

    /// Persist every completed session to `store`
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Fire `on_beat` from the metronome thread on every beat
    pub fn with_beat_callback(mut self, on_beat: BeatCallback) -> Self {
        let bpm = self.metronome.bpm();
        self.metronome = Metronome::new(bpm).with_callback(on_beat);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Switch modes; refused while a session is running
    pub fn set_mode(&mut self, mode: SessionMode) -> bool {
        if self.is_active() {
            return false;
        }
        if mode != self.mode {
            self.stop_session();
            self.mode = mode;
            tracing::info!(mode = mode.as_str(), "mode changed");
        }
        true
    }

    /// Start (or restart) a session in the current mode
    pub fn start_session(&mut self, now: Instant) -> Result<(), StartRefusal> {
        // Join any previous beat thread before a new session begins
        self.metronome.stop();

        match self.mode {
            SessionMode::Hold => {
                self.follow.stop();
                self.hold.start(now);
            }
            SessionMode::Follow => {
                let path = self.build_target_path().ok_or_else(|| {
                    tracing::warn!("FOLLOW needs points A and B before starting");
                    StartRefusal::EndpointsNotCalibrated
                })?;
                self.target_path = Some(path);
                self.hold.stop();
                self.metronome.start();
                self.follow.start(now, self.metronome.bpm());
            }
        }
        self.session_start = Some(now);
        Ok(())
    }

    fn build_target_path(&self) -> Option<TargetPath> {
        let follow = &self.config.follow;
        match follow.path_style {
            PathStyle::Linear => self
                .segment
                .endpoints()
                .map(|(a, b)| TargetPath::linear(a, b, follow)),
            PathStyle::Orbit => Some(TargetPath::Orbit(OrbitPath::for_frame(
                self.config.frame_width,
                self.config.frame_height,
                follow.orbit_radius_fraction,
                follow.orbit_period_s,
            ))),
        }
    }

    /// Abandon a running session or dismiss a completed one
    pub fn stop_session(&mut self) {
        self.metronome.stop();
        match self.mode {
            SessionMode::Hold => self.hold.stop(),
            SessionMode::Follow => self.follow.stop(),
        }
        self.session_start = None;
    }

    /// Feed one frame; returns the summary when this frame completes the session
    pub fn tick(&mut self, position: Option<Point>, now: Instant) -> Option<SessionSummary> {
        self.last_position = position.or(self.last_position);

        let completed = match self.mode {
            SessionMode::Hold => {
                let circle = self.effective_circle();
                self.hold.update(position, Some(circle), now).cloned()
            }
            SessionMode::Follow => {
                let target = self.current_target(now);
                let beats = self.metronome.beat_count();
                self.follow.update(position, target, beats, now).cloned()
            }
        };

        if let Some(summary) = &completed {
            self.metronome.stop();
            if let Some(store) = &self.store {
                if let Err(e) = store.save(summary) {
                    tracing::warn!(error = %e, "failed to save session");
                }
            }
        }
        completed
    }

    /// Calibrated circle, or the default circle centered in the frame
    pub fn effective_circle(&self) -> (Point, f64) {
        self.circle.circle().unwrap_or_else(|| {
            (
                Point::new(
                    self.config.frame_width as f64 / 2.0,
                    self.config.frame_height as f64 / 2.0,
                ),
                self.config.hold.default_circle_radius,
            )
        })
    }

    /// Target position at `now`, while a FOLLOW session is running
    pub fn current_target(&self, now: Instant) -> Option<Point> {
        if self.mode != SessionMode::Follow || !self.follow.is_active() {
            return None;
        }
        let start = self.session_start?;
        let t = now.saturating_duration_since(start).as_secs_f64();
        self.target_path.as_ref().map(|path| path.position(t))
    }

    /// Current target speed over the base rate
    pub fn speed_multiplier(&self) -> f64 {
        match &self.target_path {
            Some(path) if self.follow.is_active() => path.speed_multiplier(self.follow.elapsed_time()),
            _ => 1.0,
        }
    }

    /// Calibration click in frame coordinates; ignored while a session runs
    pub fn handle_click(&mut self, click: Point) {
        if self.is_active() {
            tracing::debug!("click ignored during session");
            return;
        }
        match self.mode {
            SessionMode::Hold => self.circle.handle_click(click),
            SessionMode::Follow => self.segment.handle_click(click),
        }
    }

    /// Clear the current mode's calibration; ignored while a session runs
    pub fn reset_calibration(&mut self) {
        if self.is_active() {
            return;
        }
        match self.mode {
            SessionMode::Hold => self.circle.reset(),
            SessionMode::Follow => self.segment.reset(),
        }
        tracing::info!(mode = self.mode.as_str(), "calibration reset");
    }

    /// Change the metronome tempo by `delta`; returns the resulting BPM
    ///
    /// Only FOLLOW uses the metronome, and the tempo is locked while it ticks.
    pub fn adjust_bpm(&mut self, delta: i32) -> u32 {
        if self.mode == SessionMode::Follow {
            let bpm = self.metronome.bpm().saturating_add_signed(delta);
            if self.metronome.set_bpm(bpm) {
                tracing::debug!(bpm = self.metronome.bpm(), "bpm adjusted");
            }
        }
        self.metronome.bpm()
    }

    pub fn bpm(&self) -> u32 {
        self.metronome.bpm()
    }

    pub fn beat_count(&self) -> u64 {
        self.metronome.beat_count()
    }

    pub fn metronome_running(&self) -> bool {
        self.metronome.is_running()
    }

    pub fn circle_calibration(&self) -> &CircleCalibration {
        &self.circle
    }

    pub fn segment_calibration(&self) -> &SegmentCalibration {
        &self.segment
    }

    /// Whether the current mode can start right now
    pub fn ready(&self) -> bool {
        match self.mode {
            SessionMode::Hold => true,
            SessionMode::Follow => {
                self.config.follow.path_style == PathStyle::Orbit || self.segment.is_complete()
            }
        }
    }

    /// Marker is inside the box around point A
    pub fn marker_at_start(&self) -> bool {
        match (self.last_position, self.segment.point_a()) {
            (Some(p), Some(a)) => point_in_rect(p, a, ENDPOINT_BOX_SIZE),
            _ => false,
        }
    }

    /// Distance of the marker from the calibrated A-B segment
    pub fn path_deviation(&self) -> Option<f64> {
        let p = self.last_position?;
        let (a, b) = self.segment.endpoints()?;
        Some(point_to_segment_distance(p, a, b))
    }

    pub fn state(&self) -> SessionState {
        match self.mode {
            SessionMode::Hold => self.hold.state(),
            SessionMode::Follow => self.follow.state(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.hold.is_active() || self.follow.is_active()
    }

    pub fn elapsed_time(&self) -> f64 {
        match self.mode {
            SessionMode::Hold => self.hold.elapsed_time(),
            SessionMode::Follow => self.follow.elapsed_time(),
        }
    }

    pub fn time_remaining(&self) -> f64 {
        match self.mode {
            SessionMode::Hold => self.hold.time_remaining(),
            SessionMode::Follow => self.follow.time_remaining(),
        }
    }

    pub fn final_metrics(&self) -> Option<&SessionSummary> {
        match self.mode {
            SessionMode::Hold => self.hold.final_metrics(),
            SessionMode::Follow => self.follow.final_metrics(),
        }
    }

    pub fn hold(&self) -> &HoldSession {
        &self.hold
    }

    pub fn follow(&self) -> &FollowSession {
        &self.follow
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        match self.mode {
            SessionMode::Hold => self.hold.snapshot(),
            SessionMode::Follow => self.follow.snapshot(),
        }
    }
}
