//! Exponential low-pass filter over consecutive keypoint frames.
//!
//! Suppresses detector jitter before classification and evaluation. The filter
//! is pure: the previous smoothed frame is an explicit argument, never hidden
//! state.

use crate::types::{Keypoint, KeypointFrame};

/// `alpha` weights the previous frame; visibility always passes through raw so
/// a stale confidence can never mask a real occlusion.
pub fn smooth(new: &KeypointFrame, prev: Option<&KeypointFrame>, alpha: f64) -> KeypointFrame {
    let Some(prev) = prev else {
        return new.clone();
    };

    let points = new
        .points()
        .iter()
        .zip(prev.points())
        .map(|(lm, p)| Keypoint {
            x: p.x * alpha + lm.x * (1.0 - alpha),
            y: p.y * alpha + lm.y * (1.0 - alpha),
            z: p.z * alpha + lm.z * (1.0 - alpha),
            visibility: lm.visibility,
        })
        .collect();

    KeypointFrame::new(points).expect("frame lengths already match")
}
