//! Motor-control metrics: per-tick signal processing of marker positions
//!
//! # Components
//! - `geometry.rs`: Point type, distances, percentiles
//! - `smoothing.rs`: Bounded position history with moving average
//! - `rolling.rs`: Count- and time-bounded metric windows
//! - `jitter.rs`: Total and lateral jitter, stability levels, scores
//! - `kinematics.rs`: Jerk chain and wobble ratio

pub mod geometry;
pub mod jitter;
pub mod kinematics;
pub mod rolling;
pub mod smoothing;

pub use geometry::Point;
pub use jitter::{JitterSummary, JitterTracker, StabilityLevel};
pub use kinematics::DerivativeChain;
pub use rolling::RollingWindow;
pub use smoothing::SmoothingWindow;
