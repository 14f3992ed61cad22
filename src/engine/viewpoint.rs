//! Camera-viewpoint classification.
//!
//! Pure function over a smoothed frame. Decision order matters: back is ruled
//! out first (face absent, body present), then side, then front; diagonal is
//! the deliberate catch-all rather than a narrow geometric test.

use crate::constants::{LEFT_EAR, LEFT_EYE, LEFT_SHOULDER, NOSE, RIGHT_EAR, RIGHT_EYE, RIGHT_SHOULDER};
use crate::engine::config::DetectionConfig;
use crate::types::{KeypointFrame, ViewMode};

pub fn classify(frame: &KeypointFrame, config: &DetectionConfig) -> ViewMode {
    let min_vis = config.min_visibility;
    let t = &config.viewpoint;

    let left_shoulder = frame.point(LEFT_SHOULDER);
    let right_shoulder = frame.point(RIGHT_SHOULDER);
    let nose = frame.point(NOSE);

    let shoulder_width = (left_shoulder.x - right_shoulder.x).abs();
    let vis_asymmetry = (left_shoulder.visibility - right_shoulder.visibility).abs();
    let avg_shoulder_vis = (left_shoulder.visibility + right_shoulder.visibility) / 2.0;

    let left_ear_visible = frame.point(LEFT_EAR).visibility >= min_vis;
    let right_ear_visible = frame.point(RIGHT_EAR).visibility >= min_vis;
    let no_ears_visible = !left_ear_visible && !right_ear_visible;
    let one_ear_visible = left_ear_visible != right_ear_visible;

    let left_eye_visible = frame.point(LEFT_EYE).visibility >= min_vis;
    let right_eye_visible = frame.point(RIGHT_EYE).visibility >= min_vis;
    let both_eyes_visible = left_eye_visible && right_eye_visible;
    let no_eyes_visible = !left_eye_visible && !right_eye_visible;

    let nose_visible = nose.visibility >= min_vis;

    let shoulder_center_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let nose_offset = (nose.x - shoulder_center_x).abs();

    // Back: face landmarks gone while the body is still confidently present.
    if !nose_visible && no_eyes_visible && no_ears_visible && avg_shoulder_vis > t.back_min_shoulder_vis
    {
        return ViewMode::Back;
    }
    if !nose_visible && no_eyes_visible && avg_shoulder_vis > t.back_min_shoulder_vis_strong {
        return ViewMode::Back;
    }

    let is_pure_side = shoulder_width < t.side_max_width
        || (one_ear_visible
            && shoulder_width < t.side_one_ear_max_width
            && vis_asymmetry > t.side_vis_asymmetry)
        || vis_asymmetry > t.side_strong_asymmetry;
    if is_pure_side {
        return ViewMode::Side;
    }

    let is_pure_front = shoulder_width >= t.front_min_width
        && both_eyes_visible
        && nose_offset < t.front_max_nose_offset
        && vis_asymmetry < t.front_max_asymmetry;
    if is_pure_front {
        return ViewMode::Front;
    }

    ViewMode::Diagonal
}
