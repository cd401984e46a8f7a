//! Target generation for FOLLOW mode
//!
//! # Components
//! - `path.rs`: Linear A/B and circular orbit target paths
//! - `metronome.rs`: Background beat counter

pub mod metronome;
pub mod path;

pub use metronome::Metronome;
pub use path::{LinearPath, OrbitPath, TargetPath};
