use std::collections::HashMap;

use crate::constants::{
    LEFT_EAR, LEFT_EYE, LEFT_SHOULDER, LEFT_WRIST, NOSE, RIGHT_EAR, RIGHT_EYE, RIGHT_SHOULDER,
    RIGHT_WRIST,
};
use crate::engine::config::DetectionConfig;
use crate::engine::evaluate::ViewEvaluator;
use crate::engine::{distance, pick_visible, visible};
use crate::types::{CalibrationProfile, EvaluationResult, IssueLabel, KeypointFrame};

/// Diagonal view: head-relative offsets carry most of the signal; the signed
/// nose-ear vertical delta separates leaning forward from leaning back, and
/// dual-shoulder metrics act as fallbacks when they were captured.
pub struct DiagonalEvaluator;

impl ViewEvaluator for DiagonalEvaluator {
    fn evaluate(
        &self,
        frame: &KeypointFrame,
        profile: &CalibrationProfile,
        config: &DetectionConfig,
        sensitivity: f64,
    ) -> EvaluationResult {
        let CalibrationProfile::Diagonal(baseline) = profile else {
            return EvaluationResult::skipped("calibration profile mismatch");
        };
        let min_vis = config.min_visibility;
        let t = &config.diagonal;

        let left_shoulder = frame.point(LEFT_SHOULDER);
        let right_shoulder = frame.point(RIGHT_SHOULDER);
        let Some(main_shoulder) = pick_visible(left_shoulder, right_shoulder, min_vis) else {
            return EvaluationResult::skipped("shoulders not visible");
        };
        let both_shoulders = visible(left_shoulder, min_vis) && visible(right_shoulder, min_vis);

        let ear = pick_visible(frame.point(LEFT_EAR), frame.point(RIGHT_EAR), min_vis);
        let eye = pick_visible(frame.point(LEFT_EYE), frame.point(RIGHT_EYE), min_vis);
        let nose = frame.point(NOSE);
        let nose_visible = visible(nose, min_vis);

        let mut issues = Vec::new();
        let mut metrics = HashMap::new();

        // Primary forward-neck signal for this view.
        if let (Some(ear), Some(calibrated), true) = (ear, baseline.ear_nose_x, nose_visible) {
            let ear_nose_x = ear.x - nose.x;
            let diff = ear_nose_x - calibrated;
            let neck_threshold = t.neck_forward * sensitivity;
            metrics.insert("earNoseXDiff".to_string(), diff);
            metrics.insert("neckThreshold".to_string(), neck_threshold);
            if diff.abs() > neck_threshold {
                issues.push(IssueLabel::ForwardNeck);
            }
        }

        // Head drop: ear height when calibrated, nose height as fallback.
        let head_threshold = t.head_drop * sensitivity;
        if let (Some(ear), Some(ear_y)) = (ear, baseline.ear_y) {
            let head_drop = ear.y - ear_y;
            metrics.insert("headDrop".to_string(), head_drop);
            if head_drop > head_threshold {
                issues.push(IssueLabel::HeadDrop);
            }
        } else if let (true, Some(nose_y)) = (nose_visible, baseline.nose_y) {
            let head_drop = nose.y - nose_y;
            metrics.insert("headDrop".to_string(), head_drop);
            if head_drop > head_threshold {
                issues.push(IssueLabel::HeadDrop);
            }
        }

        if let (Some(ear), Some(eye), Some(calibrated)) = (ear, eye, baseline.ear_eye_y) {
            let diff = (ear.y - eye.y - calibrated).abs();
            metrics.insert("earEyeYDiff".to_string(), diff);
            if diff > t.head_tilt * sensitivity {
                issues.push(IssueLabel::HeadTilt);
            }
        }

        // Signed bend: nose sinking relative to the ear means leaning forward,
        // rising means leaning back; mutually exclusive by construction.
        let mut bend_checked = false;
        if let (Some(ear), Some(calibrated), true) = (ear, baseline.nose_ear_y_diff, nose_visible) {
            bend_checked = true;
            let change = (nose.y - ear.y) - calibrated;
            let bend_threshold = t.bend * sensitivity;
            metrics.insert("noseEarChange".to_string(), change);
            metrics.insert("bendThreshold".to_string(), bend_threshold);
            if change > bend_threshold {
                issues.push(IssueLabel::LeaningForward);
            } else if change < -bend_threshold {
                issues.push(IssueLabel::LeaningBack);
            }
        }
        if !bend_checked {
            // No usable head pair: fall back to shoulder height.
            let shoulder_y_diff = match (&baseline.shoulders, both_shoulders) {
                (Some(s), true) => {
                    (left_shoulder.y + right_shoulder.y) / 2.0 - s.shoulder_center_y
                }
                _ => main_shoulder.y - baseline.shoulder_y,
            };
            let drop_threshold = t.shoulder_drop * sensitivity;
            metrics.insert("shoulderYDiff".to_string(), shoulder_y_diff);
            if shoulder_y_diff > drop_threshold {
                issues.push(IssueLabel::Slouching);
            }
        }

        // Secondary leaning-forward corroboration via shoulder width.
        if let (Some(s), true) = (&baseline.shoulders, both_shoulders) {
            let width = (left_shoulder.x - right_shoulder.x).abs();
            let width_ratio = width / s.shoulder_width;
            let width_threshold = 1.0 - t.shoulder_width * sensitivity;
            metrics.insert("widthRatio".to_string(), width_ratio);
            if width_ratio < width_threshold && !issues.contains(&IssueLabel::LeaningForward) {
                issues.push(IssueLabel::LeaningForward);
            }
        }

        if nose_visible {
            let mut resting = false;
            for (key, wrist_idx) in [("leftWristDist", LEFT_WRIST), ("rightWristDist", RIGHT_WRIST)]
            {
                let wrist = frame.point(wrist_idx);
                if visible(wrist, min_vis) {
                    let dist = distance(wrist, nose);
                    metrics.insert(key.to_string(), dist);
                    if dist < t.chin_rest_distance {
                        resting = true;
                    }
                }
            }
            if resting {
                issues.push(IssueLabel::ChinResting);
            }
        }

        EvaluationResult::from_issues(issues, metrics)
    }
}
