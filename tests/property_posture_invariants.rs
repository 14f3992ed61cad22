//! Property tests for the invariants the engine promises regardless of input
//! geometry.

mod common;

use proptest::prelude::*;

use upright::constants::{FRAME_LEN, LEFT_SHOULDER, NOSE, RIGHT_SHOULDER};
use upright::engine::{evaluate, smoothing, viewpoint};
use upright::types::{
    CalibrationProfile, Keypoint, KeypointFrame, PostureStatus, ShoulderBaseline,
};
use upright::DetectionConfig;

use common::{blank_points, frame, set};

fn arbitrary_frame() -> impl Strategy<Value = KeypointFrame> {
    prop::collection::vec((0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64), FRAME_LEN).prop_map(|raw| {
        let points = raw
            .into_iter()
            .map(|(x, y, visibility)| Keypoint {
                x,
                y,
                z: 0.0,
                visibility,
            })
            .collect();
        KeypointFrame::new(points).expect("33 landmarks")
    })
}

/// Frontal pose whose deviations from the baseline below are controlled by
/// the generated offsets.
fn front_pose(center_y: f64, width: f64, nose_y: f64) -> KeypointFrame {
    let mut p = blank_points();
    set(&mut p, NOSE, 0.50, nose_y, 0.9);
    set(&mut p, LEFT_SHOULDER, 0.5 - width / 2.0, center_y, 0.9);
    set(&mut p, RIGHT_SHOULDER, 0.5 + width / 2.0, center_y, 0.9);
    frame(p)
}

fn front_profile() -> CalibrationProfile {
    CalibrationProfile::Front(ShoulderBaseline {
        shoulder_center_y: 0.40,
        shoulder_width: 0.20,
        shoulder_tilt: 0.00,
        nose_y: Some(0.30),
    })
}

proptest! {
    /// Status is a pure function of the issue count: 0 good, 1 warning,
    /// 2+ bad.
    #[test]
    fn status_always_follows_issue_count(
        center_y in 0.3..0.6f64,
        width in 0.12..0.3f64,
        nose_y in 0.2..0.45f64,
    ) {
        let result = evaluate::evaluate(
            &front_pose(center_y, width, nose_y),
            &front_profile(),
            &DetectionConfig::default(),
            1.0,
        );
        prop_assert_eq!(
            result.status,
            PostureStatus::from_issue_count(result.issues.len())
        );
    }

    /// Raising sensitivity never introduces an issue that a stricter setting
    /// did not already flag.
    #[test]
    fn higher_sensitivity_flags_a_subset(
        center_y in 0.3..0.6f64,
        width in 0.12..0.3f64,
        nose_y in 0.2..0.45f64,
        low in 0.5..1.2f64,
        delta in 0.0..0.8f64,
    ) {
        let config = DetectionConfig::default();
        let pose = front_pose(center_y, width, nose_y);
        let strict = evaluate::evaluate(&pose, &front_profile(), &config, low);
        let tolerant = evaluate::evaluate(&pose, &front_profile(), &config, low + delta);
        for issue in &tolerant.issues {
            prop_assert!(strict.issues.contains(issue));
        }
    }

    /// Smoothing with no history is the identity.
    #[test]
    fn smoothing_without_history_is_identity(new in arbitrary_frame()) {
        let smoothed = smoothing::smooth(&new, None, 0.85);
        prop_assert_eq!(smoothed, new);
    }

    /// Each smoothed coordinate lies between the previous and the new value,
    /// and visibility passes through unsmoothed.
    #[test]
    fn smoothing_stays_between_endpoints(
        prev in arbitrary_frame(),
        new in arbitrary_frame(),
        alpha in 0.0..1.0f64,
    ) {
        let smoothed = smoothing::smooth(&new, Some(&prev), alpha);
        for ((s, p), n) in smoothed
            .points()
            .iter()
            .zip(prev.points())
            .zip(new.points())
        {
            let (lo, hi) = if p.x <= n.x { (p.x, n.x) } else { (n.x, p.x) };
            prop_assert!(s.x >= lo - 1e-12 && s.x <= hi + 1e-12);
            let (lo, hi) = if p.y <= n.y { (p.y, n.y) } else { (n.y, p.y) };
            prop_assert!(s.y >= lo - 1e-12 && s.y <= hi + 1e-12);
            prop_assert_eq!(s.visibility, n.visibility);
        }
    }

    /// Classification is deterministic and total over arbitrary geometry.
    #[test]
    fn classification_is_deterministic(frame in arbitrary_frame()) {
        let config = DetectionConfig::default();
        let first = viewpoint::classify(&frame, &config);
        let second = viewpoint::classify(&frame, &config);
        prop_assert_eq!(first, second);
    }
}
