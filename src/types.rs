use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::FRAME_LEN;
use crate::error::EngineError;

/// A single normalized body-joint estimate with a detection confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

/// Ordered, fixed-length sequence of 33 keypoints at the indices declared in
/// [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keypoint>", into = "Vec<Keypoint>")]
pub struct KeypointFrame(Vec<Keypoint>);

impl KeypointFrame {
    pub fn new(points: Vec<Keypoint>) -> Result<Self, EngineError> {
        if points.len() != FRAME_LEN {
            return Err(EngineError::FrameLength(points.len()));
        }
        Ok(Self(points))
    }

    pub fn point(&self, index: usize) -> &Keypoint {
        &self.0[index]
    }

    pub fn points(&self) -> &[Keypoint] {
        &self.0
    }
}

impl TryFrom<Vec<Keypoint>> for KeypointFrame {
    type Error = EngineError;

    fn try_from(points: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<KeypointFrame> for Vec<Keypoint> {
    fn from(frame: KeypointFrame) -> Self {
        frame.0
    }
}

/// Coarse camera-relative orientation of the subject. Determined once per
/// calibration and immutable until recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Front,
    Side,
    Diagonal,
    Back,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Side => "side",
            Self::Diagonal => "diagonal",
            Self::Back => "back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureStatus {
    Good,
    Warning,
    Bad,
}

impl PostureStatus {
    /// The status/issue-count invariant: 0 issues is good, 1 is warning,
    /// 2 or more is bad. Status is never decided anywhere else.
    pub fn from_issue_count(count: usize) -> Self {
        match count {
            0 => Self::Good,
            1 => Self::Warning,
            _ => Self::Bad,
        }
    }

    pub fn is_good(self) -> bool {
        self == Self::Good
    }
}

/// Closed set of posture issue labels across all viewpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueLabel {
    Slouching,
    ShoulderTension,
    LeaningForward,
    LeaningBack,
    ShoulderTilt,
    HeadDrop,
    ForwardNeck,
    HeadTilt,
    ChinResting,
    RoundedBack,
}

impl IssueLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slouching => "slouching",
            Self::ShoulderTension => "shoulder-tension",
            Self::LeaningForward => "leaning-forward",
            Self::LeaningBack => "leaning-back",
            Self::ShoulderTilt => "shoulder-tilt",
            Self::HeadDrop => "head-drop",
            Self::ForwardNeck => "forward-neck",
            Self::HeadTilt => "head-tilt",
            Self::ChinResting => "chin-resting",
            Self::RoundedBack => "rounded-back",
        }
    }
}

/// Outcome of evaluating one live frame against the calibration baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub status: PostureStatus,
    pub issues: Vec<IssueLabel>,
    /// Raw deviation/threshold readings for overlays and debugging.
    pub metrics: HashMap<String, f64>,
    /// Set when a precondition failed and evaluation was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl EvaluationResult {
    pub fn from_issues(mut issues: Vec<IssueLabel>, metrics: HashMap<String, f64>) -> Self {
        issues.dedup();
        Self {
            status: PostureStatus::from_issue_count(issues.len()),
            issues,
            metrics,
            diagnostic: None,
        }
    }

    /// Required landmarks were missing: report good/no-issues, never guess.
    pub fn skipped(diagnostic: &str) -> Self {
        Self {
            status: PostureStatus::Good,
            issues: Vec::new(),
            metrics: HashMap::new(),
            diagnostic: Some(diagnostic.to_string()),
        }
    }
}

/// Dual-shoulder baseline geometry, shared by the front and back profiles and
/// used as an optional fallback for diagonal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoulderBaseline {
    pub shoulder_center_y: f64,
    pub shoulder_width: f64,
    pub shoulder_tilt: f64,
    pub nose_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideBaseline {
    pub shoulder_y: f64,
    pub ear_shoulder_x: Option<f64>,
    pub nose_y: Option<f64>,
    pub ear_nose_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagonalBaseline {
    pub shoulder_y: f64,
    pub nose_y: Option<f64>,
    pub ear_y: Option<f64>,
    pub ear_nose_x: Option<f64>,
    pub ear_eye_y: Option<f64>,
    pub nose_ear_y_diff: Option<f64>,
    /// Captured when both shoulders happened to be visible at calibration
    /// time; the evaluator falls back to these metrics.
    pub shoulders: Option<ShoulderBaseline>,
}

/// Per-viewpoint baseline captured at calibration. Immutable once built;
/// replaced wholesale on recalibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "viewMode", rename_all = "lowercase")]
pub enum CalibrationProfile {
    Front(ShoulderBaseline),
    Side(SideBaseline),
    Diagonal(DiagonalBaseline),
    Back(ShoulderBaseline),
}

impl CalibrationProfile {
    pub fn view_mode(&self) -> ViewMode {
        match self {
            Self::Front(_) => ViewMode::Front,
            Self::Side(_) => ViewMode::Side,
            Self::Diagonal(_) => ViewMode::Diagonal,
            Self::Back(_) => ViewMode::Back,
        }
    }
}

/// Monotonically accumulated counters for one monitoring session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub good_ticks: u64,
    pub bad_ticks: u64,
    pub alert_count: u32,
    pub issue_counts: HashMap<IssueLabel, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub status: PostureStatus,
    pub issues: Vec<IssueLabel>,
}

/// Finalized outcome of one monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub id: Uuid,
    /// Session length in whole seconds.
    pub duration: u64,
    /// Sampling-tick counts, not wall seconds.
    pub good_time: u64,
    pub bad_time: u64,
    pub alerts: u32,
    /// Integer round of goodTime/(goodTime+badTime)*100; 0 when no ticks.
    pub good_percentage: u32,
    pub issue_count: HashMap<IssueLabel, u32>,
    pub view_mode: ViewMode,
    pub timestamp: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub timeline: Vec<TimelineEntry>,
}

/// Tunables supplied by the settings collaborator; re-read between frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Threshold multiplier in [0.5, 2.0]; higher is more tolerant.
    pub sensitivity: f64,
    pub alert_delay_secs: u64,
    pub alert_enabled: bool,
    /// Break reminder interval; 0 disables reminders.
    pub break_interval_min: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            alert_delay_secs: 3,
            alert_enabled: true,
            break_interval_min: 30,
        }
    }
}

impl Settings {
    /// Sensitivity outside [0.5, 2.0] is clamped rather than rejected.
    pub fn clamped_sensitivity(&self) -> f64 {
        self.sensitivity.clamp(0.5, 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Calibrating,
    Monitoring,
}

/// Per-frame report handed to the rendering collaborator and the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpdate {
    pub state: SessionState,
    pub status: PostureStatus,
    pub issues: Vec<IssueLabel>,
    pub view_mode: Option<ViewMode>,
    pub pose_in_guide: bool,
    /// True when the alert scheduler dispatched a notification this frame.
    pub alert_fired: bool,
    /// True when a break reminder came due this frame.
    pub break_due: bool,
    pub metrics: HashMap<String, f64>,
}

impl FrameUpdate {
    pub fn idle(state: SessionState) -> Self {
        Self {
            state,
            status: PostureStatus::Good,
            issues: Vec::new(),
            view_mode: None,
            pose_in_guide: false,
            alert_fired: false,
            break_due: false,
            metrics: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_length() {
        let err = KeypointFrame::new(vec![]).unwrap_err();
        assert!(matches!(err, EngineError::FrameLength(0)));
    }

    #[test]
    fn status_follows_issue_count() {
        assert_eq!(PostureStatus::from_issue_count(0), PostureStatus::Good);
        assert_eq!(PostureStatus::from_issue_count(1), PostureStatus::Warning);
        assert_eq!(PostureStatus::from_issue_count(2), PostureStatus::Bad);
        assert_eq!(PostureStatus::from_issue_count(7), PostureStatus::Bad);
    }

    #[test]
    fn issue_labels_serialize_kebab_case() {
        let json = serde_json::to_string(&IssueLabel::ForwardNeck).unwrap();
        assert_eq!(json, "\"forward-neck\"");
        let json = serde_json::to_string(&IssueLabel::ChinResting).unwrap();
        assert_eq!(json, "\"chin-resting\"");
    }

    #[test]
    fn profile_reports_view_mode() {
        let profile = CalibrationProfile::Back(ShoulderBaseline {
            shoulder_center_y: 0.4,
            shoulder_width: 0.2,
            shoulder_tilt: 0.01,
            nose_y: None,
        });
        assert_eq!(profile.view_mode(), ViewMode::Back);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["viewMode"], "back");
    }
}
