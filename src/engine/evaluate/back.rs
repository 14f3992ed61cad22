use std::collections::HashMap;

use crate::constants::{LEFT_SHOULDER, RIGHT_SHOULDER};
use crate::engine::config::DetectionConfig;
use crate::engine::evaluate::ViewEvaluator;
use crate::engine::visible;
use crate::types::{CalibrationProfile, EvaluationResult, IssueLabel, KeypointFrame};

/// Back view: only shoulder geometry is trustworthy, so the checks are the
/// dual-shoulder subset with rounded-back instead of leaning-forward.
pub struct BackEvaluator;

impl ViewEvaluator for BackEvaluator {
    fn evaluate(
        &self,
        frame: &KeypointFrame,
        profile: &CalibrationProfile,
        config: &DetectionConfig,
        sensitivity: f64,
    ) -> EvaluationResult {
        let CalibrationProfile::Back(baseline) = profile else {
            return EvaluationResult::skipped("calibration profile mismatch");
        };
        let min_vis = config.min_visibility;
        let t = &config.back;

        let left_shoulder = frame.point(LEFT_SHOULDER);
        let right_shoulder = frame.point(RIGHT_SHOULDER);
        if !visible(left_shoulder, min_vis) || !visible(right_shoulder, min_vis) {
            return EvaluationResult::skipped("shoulders not visible");
        }

        let mut issues = Vec::new();
        let mut metrics = HashMap::new();

        let shoulder_center_y = (left_shoulder.y + right_shoulder.y) / 2.0;
        let shoulder_y_diff = shoulder_center_y - baseline.shoulder_center_y;
        let drop_threshold = t.shoulder_drop * sensitivity;
        metrics.insert("shoulderYDiff".to_string(), shoulder_y_diff);
        if shoulder_y_diff > drop_threshold {
            issues.push(IssueLabel::Slouching);
        }

        // Narrowing shoulders seen from behind read as a rounded upper back.
        let width = (left_shoulder.x - right_shoulder.x).abs();
        let width_ratio = width / baseline.shoulder_width;
        let width_threshold = 1.0 - t.shoulder_width * sensitivity;
        metrics.insert("widthRatio".to_string(), width_ratio);
        metrics.insert("widthThreshold".to_string(), width_threshold);
        if width_ratio < width_threshold {
            issues.push(IssueLabel::RoundedBack);
        }

        let tilt = (left_shoulder.y - right_shoulder.y).abs();
        let tilt_diff = tilt - baseline.shoulder_tilt;
        metrics.insert("tiltDiff".to_string(), tilt_diff);
        if tilt_diff > t.shoulder_tilt * sensitivity {
            issues.push(IssueLabel::ShoulderTilt);
        }

        EvaluationResult::from_issues(issues, metrics)
    }
}
