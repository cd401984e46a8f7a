//! Session lifecycle shared by HOLD and FOLLOW
//!
//! Idle -> Running on start, Running -> Complete once the elapsed time
//! reaches the configured duration, Running -> Idle on a manual stop.
//! Time is taken from the tick timestamps, so a session can be replayed
//! deterministically.

use crate::config::seconds_or;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Training mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "FOLLOW")]
    Follow,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Hold => "HOLD",
            SessionMode::Follow => "FOLLOW",
        }
    }
}

/// Where a session is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running { start: Instant },
    Complete { start: Instant, end: Instant },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Running { .. } => "RUNNING",
            SessionState::Complete { .. } => "COMPLETE",
        }
    }
}

/// Timer and state machine for one session
#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: SessionState,
    duration: Duration,
    /// Timestamp of the most recent tick while running
    last_tick: Option<Instant>,
}

impl Lifecycle {
    pub fn new(duration_s: f64) -> Self {
        Lifecycle {
            state: SessionState::Idle,
            duration: seconds_or(duration_s, Duration::ZERO),
            last_tick: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Complete { .. })
    }

    /// Enter Running from any state
    pub fn start(&mut self, now: Instant) {
        self.state = SessionState::Running { start: now };
        self.last_tick = Some(now);
    }

    /// Return to Idle
    pub fn stop(&mut self) {
        self.state = SessionState::Idle;
        self.last_tick = None;
    }

    /// Record a tick; returns true on the tick that completes the session
    pub fn advance(&mut self, now: Instant) -> bool {
        let SessionState::Running { start } = self.state else {
            return false;
        };
        self.last_tick = Some(now);
        if now.saturating_duration_since(start) >= self.duration {
            self.state = SessionState::Complete { start, end: now };
            return true;
        }
        false
    }

    /// Seconds since start, as of the last tick
    pub fn elapsed_time(&self) -> f64 {
        match self.state {
            SessionState::Idle => 0.0,
            SessionState::Running { start } => self
                .last_tick
                .map(|t| t.saturating_duration_since(start).as_secs_f64())
                .unwrap_or(0.0),
            SessionState::Complete { start, end } => {
                end.saturating_duration_since(start).as_secs_f64()
            }
        }
    }

    /// Seconds left while running, 0 otherwise
    pub fn time_remaining(&self) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        (self.duration.as_secs_f64() - self.elapsed_time()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_ignores_ticks() {
        let mut lifecycle = Lifecycle::new(1.0);
        assert!(!lifecycle.advance(Instant::now() + Duration::from_secs(5)));
        assert_eq!(lifecycle.state(), SessionState::Idle);
        assert_eq!(lifecycle.elapsed_time(), 0.0);
    }

    #[test]
    fn test_completes_on_boundary_tick() {
        let start = Instant::now();
        let mut lifecycle = Lifecycle::new(1.0);
        lifecycle.start(start);

        assert!(!lifecycle.advance(start + Duration::from_millis(999)));
        assert!(lifecycle.is_active());
        assert!((lifecycle.time_remaining() - 0.001).abs() < 1e-9);

        assert!(lifecycle.advance(start + Duration::from_millis(1000)));
        assert!(lifecycle.is_complete());
        assert_eq!(lifecycle.time_remaining(), 0.0);
        assert!((lifecycle.elapsed_time() - 1.0).abs() < 1e-9);

        // Completion happens once
        assert!(!lifecycle.advance(start + Duration::from_millis(1100)));
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let start = Instant::now();
        let mut lifecycle = Lifecycle::new(10.0);
        lifecycle.start(start);
        lifecycle.advance(start + Duration::from_secs(2));
        lifecycle.stop();
        assert_eq!(lifecycle.state(), SessionState::Idle);
        assert_eq!(lifecycle.time_remaining(), 0.0);
    }

    #[test]
    fn test_mode_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&SessionMode::Follow).unwrap(),
            "\"FOLLOW\""
        );
    }
}
