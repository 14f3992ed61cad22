use upright::constants::FRAME_LEN;
use upright::types::{Keypoint, KeypointFrame};

pub fn blank_points() -> Vec<Keypoint> {
    vec![
        Keypoint {
            x: 0.5,
            y: 0.5,
            z: 0.0,
            visibility: 0.0
        };
        FRAME_LEN
    ]
}

pub fn set(points: &mut [Keypoint], idx: usize, x: f64, y: f64, vis: f64) {
    points[idx] = Keypoint {
        x,
        y,
        z: 0.0,
        visibility: vis,
    };
}

pub fn frame(points: Vec<Keypoint>) -> KeypointFrame {
    KeypointFrame::new(points).expect("33 landmarks")
}

/// Frontal pose with both shoulders at the given height, nose/ears visible,
/// inside the default calibration guide band for heights around 0.4-0.6.
#[allow(dead_code)]
pub fn front_pose(shoulder_y: f64, nose_y: f64) -> KeypointFrame {
    use upright::constants::{
        LEFT_EAR, LEFT_EYE, LEFT_SHOULDER, NOSE, RIGHT_EAR, RIGHT_EYE, RIGHT_SHOULDER,
    };
    let mut p = blank_points();
    set(&mut p, NOSE, 0.50, nose_y, 0.9);
    set(&mut p, LEFT_EYE, 0.47, nose_y - 0.02, 0.9);
    set(&mut p, RIGHT_EYE, 0.53, nose_y - 0.02, 0.9);
    set(&mut p, LEFT_EAR, 0.44, nose_y, 0.9);
    set(&mut p, RIGHT_EAR, 0.56, nose_y, 0.9);
    set(&mut p, LEFT_SHOULDER, 0.37, shoulder_y, 0.9);
    set(&mut p, RIGHT_SHOULDER, 0.63, shoulder_y, 0.9);
    frame(p)
}
