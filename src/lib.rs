//! Steady Trainer - hand-steadiness biofeedback from a tracked marker
//!
//! Turns a ~30 Hz stream of marker positions into jitter, jerk and wobble
//! statistics, scores HOLD and FOLLOW sessions, and keeps a session history.
//!
//! # Components
//! - `metrics/`: Geometry, smoothing and rolling windows, jitter, kinematics
//! - `target/`: Moving target paths and the metronome
//! - `calibration.rs`: Two-click circle and A/B calibration
//! - `session/`: Session lifecycle, HOLD and FOLLOW scoring, summaries
//! - `trainer.rs`: Application state driving one session at a time
//! - `tracker.rs`: Marker position sources
//! - `storage.rs`: Session history file and trend stats
//! - `config.rs`, `error.rs`: Typed configuration and errors
//! - `cli/`: Terminal input and rendering

pub mod calibration;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod storage;
pub mod target;
pub mod tracker;
pub mod trainer;

#[cfg(test)]
mod integration_tests;

pub use config::TrainerConfig;
pub use error::TrainerError;
pub use trainer::Trainer;
