use crate::types::SessionState;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Required landmarks were below the minimum visibility at capture time.
    /// Nothing is stored; the caller retries calibration.
    #[error("calibration failed: {0}")]
    Calibration(&'static str),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid keypoint frame: expected 33 landmarks, got {0}")]
    FrameLength(usize),

    #[error("operation not allowed in state {actual:?}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: SessionState,
    },

    /// Failure reported by an external collaborator (perception, rendering,
    /// notification). Non-fatal for the detection loop.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("monitor is not running")]
    NotRunning,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
