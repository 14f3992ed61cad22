use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// All deviation thresholds are base values multiplied by the session
/// sensitivity at evaluation time. Defaults are tuning parameters, not
/// contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Landmarks below this confidence are treated as absent.
    pub min_visibility: f64,
    /// Exponential smoothing factor applied to x/y/z (weight on the previous
    /// frame).
    pub smoothing_alpha: f64,
    pub detection_fps: u32,
    /// Stats sampling cadence in raw frames.
    pub stats_interval_frames: u64,
    /// Timeline sampling cadence in raw frames.
    pub timeline_interval_frames: u64,
    pub max_timeline_entries: usize,
    /// Minimum continuous presence before an issue counts toward stats.
    pub issue_min_duration_ms: i64,
    /// Minimum spacing between two dispatched notifications.
    pub alert_cooldown_ms: i64,
    pub guide: GuideRegion,
    pub viewpoint: ViewpointThresholds,
    pub front: FrontThresholds,
    pub side: SideThresholds,
    pub diagonal: DiagonalThresholds,
    pub back: BackThresholds,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            smoothing_alpha: 0.85,
            detection_fps: 15,
            stats_interval_frames: 3,
            timeline_interval_frames: 30,
            max_timeline_entries: 360,
            issue_min_duration_ms: 1_000,
            alert_cooldown_ms: 3_000,
            guide: GuideRegion::default(),
            viewpoint: ViewpointThresholds::default(),
            front: FrontThresholds::default(),
            side: SideThresholds::default(),
            diagonal: DiagonalThresholds::default(),
            back: BackThresholds::default(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..1.0).contains(&self.smoothing_alpha) {
            return Err(EngineError::Config(format!(
                "smoothingAlpha must be in [0, 1), got {}",
                self.smoothing_alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(EngineError::Config(format!(
                "minVisibility must be in [0, 1], got {}",
                self.min_visibility
            )));
        }
        if self.detection_fps == 0 {
            return Err(EngineError::Config("detectionFps must be > 0".to_string()));
        }
        if self.stats_interval_frames == 0 || self.timeline_interval_frames == 0 {
            return Err(EngineError::Config(
                "sampling intervals must be > 0".to_string(),
            ));
        }
        if self.max_timeline_entries == 0 {
            return Err(EngineError::Config(
                "maxTimelineEntries must be > 0".to_string(),
            ));
        }
        if self.issue_min_duration_ms < 0 || self.alert_cooldown_ms < 0 {
            return Err(EngineError::Config(
                "durations must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn detection_interval_ms(&self) -> i64 {
        (1_000 / self.detection_fps.max(1)) as i64
    }
}

/// Normalized on-screen guide region used during calibration. The subject's
/// primary shoulder must sit inside a vertical band of this region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRegion {
    pub y: f64,
    pub height: f64,
    /// Accepted band inside the region, as fractions of its height.
    pub band_top: f64,
    pub band_bottom: f64,
}

impl Default for GuideRegion {
    fn default() -> Self {
        Self {
            y: 0.12,
            height: 0.72,
            band_top: 0.30,
            band_bottom: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewpointThresholds {
    /// Back view: average shoulder visibility floor when no ears are visible.
    pub back_min_shoulder_vis: f64,
    /// Back view: stricter floor when ear visibility is inconclusive.
    pub back_min_shoulder_vis_strong: f64,
    pub side_max_width: f64,
    pub side_one_ear_max_width: f64,
    pub side_vis_asymmetry: f64,
    pub side_strong_asymmetry: f64,
    pub front_min_width: f64,
    pub front_max_nose_offset: f64,
    pub front_max_asymmetry: f64,
}

impl Default for ViewpointThresholds {
    fn default() -> Self {
        Self {
            back_min_shoulder_vis: 0.5,
            back_min_shoulder_vis_strong: 0.6,
            side_max_width: 0.10,
            side_one_ear_max_width: 0.15,
            side_vis_asymmetry: 0.2,
            side_strong_asymmetry: 0.4,
            front_min_width: 0.22,
            front_max_nose_offset: 0.06,
            front_max_asymmetry: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontThresholds {
    pub shoulder_drop: f64,
    pub shoulder_width: f64,
    pub shoulder_tilt: f64,
    pub head_drop: f64,
    pub chin_rest_distance: f64,
    /// Elbow counts as raised when above shoulder center minus this margin.
    pub elbow_margin: f64,
}

impl Default for FrontThresholds {
    fn default() -> Self {
        Self {
            shoulder_drop: 0.035,
            shoulder_width: 0.12,
            shoulder_tilt: 0.02,
            head_drop: 0.04,
            chin_rest_distance: 0.12,
            elbow_margin: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideThresholds {
    pub head_forward: f64,
    pub shoulder_drop: f64,
    pub head_drop: f64,
    pub head_tilt: f64,
}

impl Default for SideThresholds {
    fn default() -> Self {
        Self {
            head_forward: 0.04,
            shoulder_drop: 0.04,
            head_drop: 0.05,
            head_tilt: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagonalThresholds {
    pub neck_forward: f64,
    pub head_drop: f64,
    pub head_tilt: f64,
    /// Signed nose-ear vertical delta: above means leaning forward, below
    /// means leaning back.
    pub bend: f64,
    pub shoulder_drop: f64,
    pub shoulder_width: f64,
    pub chin_rest_distance: f64,
}

impl Default for DiagonalThresholds {
    fn default() -> Self {
        Self {
            neck_forward: 0.025,
            head_drop: 0.05,
            head_tilt: 0.02,
            bend: 0.03,
            shoulder_drop: 0.045,
            shoulder_width: 0.12,
            chin_rest_distance: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackThresholds {
    pub shoulder_drop: f64,
    pub shoulder_width: f64,
    pub shoulder_tilt: f64,
}

impl Default for BackThresholds {
    fn default() -> Self {
        Self {
            shoulder_drop: 0.035,
            shoulder_width: 0.12,
            shoulder_tilt: 0.02,
        }
    }
}
