use std::collections::HashMap;

use crate::constants::{
    LEFT_ELBOW, LEFT_SHOULDER, LEFT_WRIST, NOSE, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::engine::config::DetectionConfig;
use crate::engine::evaluate::ViewEvaluator;
use crate::engine::{distance, visible};
use crate::types::{CalibrationProfile, EvaluationResult, IssueLabel, KeypointFrame};

/// Front view: dual-shoulder geometry plus nose height and a chin-resting
/// heuristic.
pub struct FrontEvaluator;

impl ViewEvaluator for FrontEvaluator {
    fn evaluate(
        &self,
        frame: &KeypointFrame,
        profile: &CalibrationProfile,
        config: &DetectionConfig,
        sensitivity: f64,
    ) -> EvaluationResult {
        let CalibrationProfile::Front(baseline) = profile else {
            return EvaluationResult::skipped("calibration profile mismatch");
        };
        let min_vis = config.min_visibility;
        let t = &config.front;

        let left_shoulder = frame.point(LEFT_SHOULDER);
        let right_shoulder = frame.point(RIGHT_SHOULDER);
        if !visible(left_shoulder, min_vis) || !visible(right_shoulder, min_vis) {
            return EvaluationResult::skipped("shoulders not visible");
        }

        let mut issues = Vec::new();
        let mut metrics = HashMap::new();

        let shoulder_center_y = (left_shoulder.y + right_shoulder.y) / 2.0;
        let shoulder_width = (left_shoulder.x - right_shoulder.x).abs();
        let shoulder_tilt = (left_shoulder.y - right_shoulder.y).abs();

        // Vertical shoulder movement: drop reads as slouching, a clear rise as
        // tensed shoulders (looser, 0.8x threshold in the other direction).
        let shoulder_y_diff = shoulder_center_y - baseline.shoulder_center_y;
        let drop_threshold = t.shoulder_drop * sensitivity;
        metrics.insert("shoulderYDiff".to_string(), shoulder_y_diff);
        metrics.insert("dropThreshold".to_string(), drop_threshold);
        if shoulder_y_diff > drop_threshold {
            issues.push(IssueLabel::Slouching);
        } else if shoulder_y_diff < -drop_threshold * 0.8 {
            issues.push(IssueLabel::ShoulderTension);
        }

        // Shrinking shoulder width means the torso moved toward the camera.
        let width_ratio = shoulder_width / baseline.shoulder_width;
        let width_threshold = 1.0 - t.shoulder_width * sensitivity;
        metrics.insert("widthRatio".to_string(), width_ratio);
        metrics.insert("widthThreshold".to_string(), width_threshold);
        if width_ratio < width_threshold {
            issues.push(IssueLabel::LeaningForward);
        }

        let tilt_diff = shoulder_tilt - baseline.shoulder_tilt;
        let tilt_threshold = t.shoulder_tilt * sensitivity;
        metrics.insert("tiltDiff".to_string(), tilt_diff);
        if tilt_diff > tilt_threshold {
            issues.push(IssueLabel::ShoulderTilt);
        }

        let nose = frame.point(NOSE);
        if visible(nose, min_vis) {
            if let Some(nose_y) = baseline.nose_y {
                let head_drop = nose.y - nose_y;
                let head_threshold = t.head_drop * sensitivity;
                metrics.insert("headDrop".to_string(), head_drop);
                metrics.insert("headThreshold".to_string(), head_threshold);
                if head_drop > head_threshold {
                    issues.push(IssueLabel::HeadDrop);
                }
            }

            if chin_resting(frame, shoulder_center_y, config, &mut metrics) {
                issues.push(IssueLabel::ChinResting);
            }
        }

        EvaluationResult::from_issues(issues, metrics)
    }
}

/// Two independent sub-checks, either sufficient: a raised elbow with the
/// wrist above the shoulder line, or a wrist close to the face.
fn chin_resting(
    frame: &KeypointFrame,
    shoulder_center_y: f64,
    config: &DetectionConfig,
    metrics: &mut HashMap<String, f64>,
) -> bool {
    let min_vis = config.min_visibility;
    let t = &config.front;
    let nose = frame.point(NOSE);
    let mut resting = false;

    for (elbow_idx, wrist_idx) in [(LEFT_ELBOW, LEFT_WRIST), (RIGHT_ELBOW, RIGHT_WRIST)] {
        let elbow = frame.point(elbow_idx);
        let wrist = frame.point(wrist_idx);
        if visible(elbow, min_vis)
            && elbow.y < shoulder_center_y + t.elbow_margin
            && visible(wrist, min_vis)
            && wrist.y < shoulder_center_y
        {
            resting = true;
        }
    }

    for (key, wrist_idx) in [("leftWristDist", LEFT_WRIST), ("rightWristDist", RIGHT_WRIST)] {
        let wrist = frame.point(wrist_idx);
        if visible(wrist, min_vis) {
            let dist = distance(wrist, nose);
            metrics.insert(key.to_string(), dist);
            if dist < t.chin_rest_distance {
                resting = true;
            }
        }
    }

    resting
}
