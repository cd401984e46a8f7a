//! Session records: the final summary and the live snapshot
//!
//! `SessionSummary` is built once, on the tick that completes a session,
//! and serializes to the persisted JSON shape:
//! `{timestamp, type, duration_s, avg_jitter, p95_jitter, <mode fields>,
//! frames_total, frames_marker_found}`.

use super::state::SessionMode;
use crate::config::{FollowScoring, HoldScoring, PathStyle};
use crate::metrics::geometry::Point;
use crate::metrics::jitter::StabilityLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Round for storage; the records are read by people
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// HOLD-specific fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HoldDetails {
    pub tremor_score: f64,
    pub scoring: HoldScoring,
    pub inside_circle_pct: f64,
    pub max_jitter: f64,
}

/// FOLLOW-specific fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FollowDetails {
    pub movement_quality_score: f64,
    pub scoring: FollowScoring,
    pub path_style: PathStyle,
    pub avg_lateral_jitter: f64,
    pub p95_lateral_jitter: f64,
    pub max_lateral_jitter: f64,
    pub avg_jerk: f64,
    pub p95_jerk: f64,
    pub wobble_ratio: f64,
    pub avg_target_error: f64,
    pub p95_target_error: f64,
    pub beats_total: u64,
    pub bpm: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModeDetails {
    Hold(HoldDetails),
    Follow(FollowDetails),
}

/// Final metrics of a completed session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub mode: SessionMode,
    pub duration_s: f64,
    pub avg_jitter: f64,
    pub p95_jitter: f64,
    #[serde(flatten)]
    pub details: ModeDetails,
    pub frames_total: u32,
    pub frames_marker_found: u32,
}

impl SessionSummary {
    /// Headline score: tremor score for HOLD, movement quality for FOLLOW
    pub fn score(&self) -> f64 {
        match &self.details {
            ModeDetails::Hold(hold) => hold.tremor_score,
            ModeDetails::Follow(follow) => follow.movement_quality_score,
        }
    }

    pub fn hold(&self) -> Option<&HoldDetails> {
        match &self.details {
            ModeDetails::Hold(hold) => Some(hold),
            ModeDetails::Follow(_) => None,
        }
    }

    pub fn follow(&self) -> Option<&FollowDetails> {
        match &self.details {
            ModeDetails::Follow(follow) => Some(follow),
            ModeDetails::Hold(_) => None,
        }
    }

    /// Fraction of frames with a detected marker, 0-100
    pub fn detection_pct(&self) -> f64 {
        if self.frames_total == 0 {
            0.0
        } else {
            self.frames_marker_found as f64 / self.frames_total as f64 * 100.0
        }
    }
}

/// Live view of a session for the presentation layer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub mode: SessionMode,
    pub state: &'static str,
    pub position: Option<Point>,
    pub target: Option<Point>,
    pub jitter: f64,
    pub lateral_jitter: f64,
    pub stability: StabilityLevel,
    /// Live score on the same scale as the final one
    pub score: f64,
    pub elapsed_s: f64,
    pub time_remaining_s: f64,
    pub beat_count: u64,
    pub frames_total: u32,
    pub frames_marker_found: u32,
}
