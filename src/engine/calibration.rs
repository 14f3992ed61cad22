//! Baseline capture for one viewpoint.
//!
//! Calibration never partially commits: either every required landmark is
//! confidently visible and a complete profile is produced, or the build fails
//! and the caller retries.

use crate::constants::{LEFT_EAR, LEFT_EYE, LEFT_SHOULDER, NOSE, RIGHT_EAR, RIGHT_EYE, RIGHT_SHOULDER};
use crate::engine::config::{DetectionConfig, GuideRegion};
use crate::engine::{pick_visible, visible};
use crate::error::EngineError;
use crate::types::{
    CalibrationProfile, DiagonalBaseline, KeypointFrame, ShoulderBaseline, SideBaseline, ViewMode,
};

pub fn build(
    frame: &KeypointFrame,
    mode: ViewMode,
    config: &DetectionConfig,
) -> Result<CalibrationProfile, EngineError> {
    let min_vis = config.min_visibility;
    let left_shoulder = frame.point(LEFT_SHOULDER);
    let right_shoulder = frame.point(RIGHT_SHOULDER);
    let nose = frame.point(NOSE);

    match mode {
        ViewMode::Front | ViewMode::Back => {
            if !visible(left_shoulder, min_vis) || !visible(right_shoulder, min_vis) {
                return Err(EngineError::Calibration("both shoulders must be visible"));
            }
            let baseline = ShoulderBaseline {
                shoulder_center_y: (left_shoulder.y + right_shoulder.y) / 2.0,
                shoulder_width: (left_shoulder.x - right_shoulder.x).abs(),
                shoulder_tilt: (left_shoulder.y - right_shoulder.y).abs(),
                nose_y: visible(nose, min_vis).then_some(nose.y),
            };
            Ok(match mode {
                ViewMode::Front => CalibrationProfile::Front(baseline),
                _ => CalibrationProfile::Back(baseline),
            })
        }
        ViewMode::Side => {
            let shoulder = pick_visible(left_shoulder, right_shoulder, min_vis)
                .ok_or(EngineError::Calibration("no visible shoulder"))?;
            let ear = pick_visible(frame.point(LEFT_EAR), frame.point(RIGHT_EAR), min_vis);
            Ok(CalibrationProfile::Side(SideBaseline {
                shoulder_y: shoulder.y,
                ear_shoulder_x: ear.map(|e| e.x - shoulder.x),
                nose_y: visible(nose, min_vis).then_some(nose.y),
                ear_nose_y: ear.and_then(|e| visible(nose, min_vis).then_some(e.y - nose.y)),
            }))
        }
        ViewMode::Diagonal => {
            let shoulder = pick_visible(left_shoulder, right_shoulder, min_vis)
                .ok_or(EngineError::Calibration("no visible shoulder"))?;
            let ear = pick_visible(frame.point(LEFT_EAR), frame.point(RIGHT_EAR), min_vis);
            let eye = pick_visible(frame.point(LEFT_EYE), frame.point(RIGHT_EYE), min_vis);
            let nose_visible = visible(nose, min_vis);

            let both_shoulders =
                visible(left_shoulder, min_vis) && visible(right_shoulder, min_vis);

            Ok(CalibrationProfile::Diagonal(DiagonalBaseline {
                shoulder_y: shoulder.y,
                nose_y: nose_visible.then_some(nose.y),
                ear_y: ear.map(|e| e.y),
                ear_nose_x: ear.and_then(|e| nose_visible.then_some(e.x - nose.x)),
                ear_eye_y: ear.and_then(|e| eye.map(|i| e.y - i.y)),
                nose_ear_y_diff: ear.and_then(|e| nose_visible.then_some(nose.y - e.y)),
                shoulders: both_shoulders.then_some(ShoulderBaseline {
                    shoulder_center_y: (left_shoulder.y + right_shoulder.y) / 2.0,
                    shoulder_width: (left_shoulder.x - right_shoulder.x).abs(),
                    shoulder_tilt: (left_shoulder.y - right_shoulder.y).abs(),
                    nose_y: nose_visible.then_some(nose.y),
                }),
            }))
        }
    }
}

/// Guide containment: the primary shoulder's normalized Y must fall inside the
/// accepted vertical band of the guide region.
pub fn pose_in_guide(frame: &KeypointFrame, guide: &GuideRegion, min_vis: f64) -> bool {
    let Some(shoulder) = pick_visible(
        frame.point(LEFT_SHOULDER),
        frame.point(RIGHT_SHOULDER),
        min_vis,
    ) else {
        return false;
    };

    let top = guide.y + guide.height * guide.band_top;
    let bottom = guide.y + guide.height * guide.band_bottom;
    shoulder.y > top && shoulder.y < bottom
}
