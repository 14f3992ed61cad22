//! Posture monitoring engine: viewpoint-aware calibration, per-frame
//! geometric evaluation, issue debouncing, alert scheduling and session
//! aggregation, driven by a cancellable async detection loop.
//!
//! The crate is collaborator-agnostic. Keypoint acquisition, rendering and
//! notification delivery arrive through the traits in [`runtime`]; everything
//! else is deterministic and clock-injected.

pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::config::DetectionConfig;
pub use engine::session::{DetectionSession, SessionHistory};
pub use error::EngineError;
pub use runtime::{Monitor, NotificationSink, PerceptionEngine, RenderSink, SettingsProvider};
pub use types::{
    CalibrationProfile, FrameUpdate, IssueLabel, Keypoint, KeypointFrame, PostureStatus,
    SessionResult, SessionState, Settings, ViewMode,
};
