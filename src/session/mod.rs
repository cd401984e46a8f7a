//! Session Management: lifecycle, per-mode metrics, and final summaries
//!
//! # Components
//! - `state.rs`: SessionMode, SessionState and the shared Lifecycle timer
//! - `hold.rs`: HOLD session with tremor scoring and circle coverage
//! - `follow.rs`: FOLLOW session with lateral jitter, jerk and wobble
//! - `summary.rs`: Persisted SessionSummary and live MetricsSnapshot

pub mod follow;
pub mod hold;
pub mod state;
pub mod summary;

pub use follow::FollowSession;
pub use hold::HoldSession;
pub use state::{Lifecycle, SessionMode, SessionState};
pub use summary::{FollowDetails, HoldDetails, MetricsSnapshot, ModeDetails, SessionSummary};
