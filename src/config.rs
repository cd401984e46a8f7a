//! Typed trainer configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Loaded from JSON and checked with [`TrainerConfig::validate`].

use crate::error::TrainerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Convert a configured number of seconds, using `fallback` when it is
/// negative, NaN or too large for a [`Duration`]
pub(crate) fn seconds_or(seconds: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or_else(|_| {
        tracing::warn!(seconds, fallback_s = fallback.as_secs_f64(), "invalid duration in config");
        fallback
    })
}

/// How the HOLD tremor score is computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldScoring {
    /// 0-100 from the session p95 jitter (higher is steadier)
    #[default]
    Normalized,
    /// `0.7 * p95 + 0.3 * avg` of the rolling jitter, raw pixels (lower is steadier)
    LegacyPixels,
}

/// How the FOLLOW movement quality score is computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowScoring {
    /// Lateral jitter score only
    #[default]
    LateralOnly,
    /// Weighted badness of p95 jitter, p95 jerk and wobble ratio
    Blended,
}

/// Which moving target FOLLOW mode draws
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// Back and forth between calibrated points A and B
    #[default]
    Linear,
    /// Fixed circle around the frame center
    Orbit,
}

/// Jitter algorithm parameters shared by both modes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Frames averaged for the expected position
    pub smoothing_window: usize,
    /// Frames spanned by the movement direction estimate
    pub direction_window: usize,
    /// Maximum frames in the rolling statistics window
    pub rolling_frames: usize,
    /// Age limit of the rolling statistics window
    pub rolling_seconds: f64,
    pub stable_threshold: f64,
    pub warning_threshold: f64,
    pub max_threshold: f64,
    pub lateral_stable_threshold: f64,
    pub lateral_warning_threshold: f64,
    pub lateral_max_threshold: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        JitterConfig {
            smoothing_window: 10,
            direction_window: 5,
            rolling_frames: 30,
            rolling_seconds: 1.0,
            stable_threshold: 5.0,
            warning_threshold: 15.0,
            max_threshold: 30.0,
            lateral_stable_threshold: 3.0,
            lateral_warning_threshold: 8.0,
            lateral_max_threshold: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    pub duration_s: f64,
    /// Circle radius used until the user calibrates one
    pub default_circle_radius: f64,
    pub scoring: HoldScoring,
}

impl Default for HoldConfig {
    fn default() -> Self {
        HoldConfig {
            duration_s: 10.0,
            default_circle_radius: 80.0,
            scoring: HoldScoring::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    pub duration_s: f64,
    pub path_style: PathStyle,
    /// Starting speed of the A/B target in cycles (A->B->A) per second
    pub base_cycles_per_second: f64,
    /// Fractional speed-up applied every `ramp_period_s`
    pub ramp_fraction: f64,
    pub ramp_period_s: f64,
    pub orbit_period_s: f64,
    /// Orbit radius as a fraction of the shorter frame side
    pub orbit_radius_fraction: f64,
    pub default_bpm: u32,
    pub jitter_ref: f64,
    pub jerk_ref: f64,
    pub wobble_ref: f64,
    pub scoring: FollowScoring,
}

impl Default for FollowConfig {
    fn default() -> Self {
        FollowConfig {
            duration_s: 30.0,
            path_style: PathStyle::default(),
            base_cycles_per_second: 0.3,
            ramp_fraction: 0.1,
            ramp_period_s: 5.0,
            orbit_period_s: 8.0,
            orbit_radius_fraction: 0.25,
            default_bpm: 60,
            jitter_ref: 6.0,
            jerk_ref: 80.0,
            wobble_ref: 0.4,
            scoring: FollowScoring::default(),
        }
    }
}

/// Top-level configuration for a trainer instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Nominal tick rate; `1 / fps` is the derivative time step
    pub fps: f64,
    pub jitter: JitterConfig,
    pub hold: HoldConfig,
    pub follow: FollowConfig,
    pub sessions_file: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            frame_width: 640,
            frame_height: 480,
            fps: 30.0,
            jitter: JitterConfig::default(),
            hold: HoldConfig::default(),
            follow: FollowConfig::default(),
            sessions_file: PathBuf::from("data/sessions.json"),
        }
    }
}

impl TrainerConfig {
    /// Load a config file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TrainerError::io(path, e))?;
        let config: TrainerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Seconds between ticks
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        let invalid = |msg: &str| Err(TrainerError::InvalidConfig(msg.to_string()));

        if self.frame_width == 0 || self.frame_height == 0 {
            return invalid("frame dimensions must be non-zero");
        }
        if !(self.fps > 0.0) {
            return invalid("fps must be positive");
        }

        let j = &self.jitter;
        if j.smoothing_window == 0 || j.rolling_frames == 0 {
            return invalid("jitter windows must be non-zero");
        }
        if j.direction_window < 2 {
            return invalid("direction_window must span at least 2 frames");
        }
        if !(j.rolling_seconds > 0.0) {
            return invalid("rolling_seconds must be positive");
        }
        if !(j.stable_threshold <= j.warning_threshold && j.stable_threshold < j.max_threshold) {
            return invalid("jitter thresholds must be ordered stable <= warning, stable < max");
        }
        if !(j.lateral_stable_threshold <= j.lateral_warning_threshold
            && j.lateral_stable_threshold < j.lateral_max_threshold)
        {
            return invalid("lateral thresholds must be ordered stable <= warning, stable < max");
        }

        if !(self.hold.duration_s > 0.0) || !(self.follow.duration_s > 0.0) {
            return invalid("session durations must be positive");
        }
        if self.hold.default_circle_radius < 0.0 {
            return invalid("default_circle_radius must not be negative");
        }

        let f = &self.follow;
        if !(f.jitter_ref > 0.0 && f.jerk_ref > 0.0 && f.wobble_ref > 0.0) {
            return invalid("follow reference thresholds must be positive");
        }
        if !(f.ramp_period_s > 0.0) || !(f.orbit_period_s > 0.0) {
            return invalid("follow periods must be positive");
        }
        if f.base_cycles_per_second < 0.0 {
            return invalid("base_cycles_per_second must not be negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(TrainerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "hold": { "duration_s": 15.0, "scoring": "legacy_pixels" } }"#;
        let config: TrainerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hold.duration_s, 15.0);
        assert_eq!(config.hold.scoring, HoldScoring::LegacyPixels);
        assert_eq!(config.hold.default_circle_radius, 80.0);
        assert_eq!(config.jitter.smoothing_window, 10);
        assert_eq!(config.follow.scoring, FollowScoring::LateralOnly);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = TrainerConfig::default();
        config.jitter.warning_threshold = 1.0;
        assert!(matches!(
            config.validate(),
            Err(TrainerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_seconds_or_falls_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(seconds_or(2.5, fallback), Duration::from_millis(2_500));
        assert_eq!(seconds_or(-3.0, fallback), fallback);
        assert_eq!(seconds_or(f64::NAN, fallback), fallback);
        assert_eq!(seconds_or(f64::INFINITY, fallback), fallback);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainer.json");
        fs::write(&path, r#"{ "follow": { "path_style": "orbit", "default_bpm": 90 } }"#).unwrap();

        let config = TrainerConfig::load(&path).unwrap();
        assert_eq!(config.follow.path_style, PathStyle::Orbit);
        assert_eq!(config.follow.default_bpm, 90);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TrainerConfig::load("/nonexistent/trainer.json").unwrap_err();
        assert!(matches!(err, TrainerError::Io { .. }));
    }
}
