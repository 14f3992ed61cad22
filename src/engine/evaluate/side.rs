use std::collections::HashMap;

use crate::constants::{LEFT_EAR, LEFT_SHOULDER, NOSE, RIGHT_EAR, RIGHT_SHOULDER};
use crate::engine::config::DetectionConfig;
use crate::engine::evaluate::ViewEvaluator;
use crate::engine::{pick_visible, visible};
use crate::types::{CalibrationProfile, EvaluationResult, IssueLabel, KeypointFrame};

/// Side view: single-shoulder profile geometry. The ear-to-shoulder horizontal
/// offset is the primary forward-neck signal.
pub struct SideEvaluator;

impl ViewEvaluator for SideEvaluator {
    fn evaluate(
        &self,
        frame: &KeypointFrame,
        profile: &CalibrationProfile,
        config: &DetectionConfig,
        sensitivity: f64,
    ) -> EvaluationResult {
        let CalibrationProfile::Side(baseline) = profile else {
            return EvaluationResult::skipped("calibration profile mismatch");
        };
        let min_vis = config.min_visibility;
        let t = &config.side;

        let Some(shoulder) = pick_visible(
            frame.point(LEFT_SHOULDER),
            frame.point(RIGHT_SHOULDER),
            min_vis,
        ) else {
            return EvaluationResult::skipped("shoulders not visible");
        };
        let ear = pick_visible(frame.point(LEFT_EAR), frame.point(RIGHT_EAR), min_vis);
        let nose = frame.point(NOSE);

        let mut issues = Vec::new();
        let mut metrics = HashMap::new();

        if let (Some(ear), Some(calibrated)) = (ear, baseline.ear_shoulder_x) {
            let ear_shoulder_x = ear.x - shoulder.x;
            let x_diff = ear_shoulder_x - calibrated;
            let forward_threshold = t.head_forward * sensitivity;
            metrics.insert("earShoulderXDiff".to_string(), x_diff);
            metrics.insert("forwardThreshold".to_string(), forward_threshold);
            if x_diff.abs() > forward_threshold {
                issues.push(IssueLabel::ForwardNeck);
            }
        }

        let shoulder_y_diff = shoulder.y - baseline.shoulder_y;
        let drop_threshold = t.shoulder_drop * sensitivity;
        metrics.insert("shoulderYDiff".to_string(), shoulder_y_diff);
        metrics.insert("dropThreshold".to_string(), drop_threshold);
        if shoulder_y_diff > drop_threshold {
            issues.push(IssueLabel::Slouching);
        }

        if visible(nose, min_vis) {
            if let Some(nose_y) = baseline.nose_y {
                let head_drop = nose.y - nose_y;
                let head_threshold = t.head_drop * sensitivity;
                metrics.insert("headDrop".to_string(), head_drop);
                if head_drop > head_threshold {
                    issues.push(IssueLabel::HeadDrop);
                }
            }
        }

        if let (Some(ear), Some(calibrated)) = (ear, baseline.ear_nose_y) {
            if visible(nose, min_vis) {
                let ear_nose_y = ear.y - nose.y;
                let diff = ear_nose_y - calibrated;
                metrics.insert("earNoseYDiff".to_string(), diff);
                if diff.abs() > t.head_tilt * sensitivity {
                    issues.push(IssueLabel::HeadTilt);
                }
            }
        }

        EvaluationResult::from_issues(issues, metrics)
    }
}
