//! Posture classification and alerting engine.
//!
//! Leaves first: smoothing, viewpoint classification, calibration capture,
//! per-viewpoint evaluation strategies, issue persistence filtering, alert
//! scheduling; `session` ties them into the Idle/Calibrating/Monitoring state
//! machine.

pub mod alerting;
pub mod calibration;
pub mod config;
pub mod evaluate;
pub mod persistence;
pub mod session;
pub mod smoothing;
pub mod viewpoint;

use crate::types::Keypoint;

pub(crate) fn visible(kp: &Keypoint, min_vis: f64) -> bool {
    kp.visibility >= min_vis
}

/// Prefer the left landmark, fall back to the right; None when neither is
/// confidently visible.
pub(crate) fn pick_visible<'a>(
    left: &'a Keypoint,
    right: &'a Keypoint,
    min_vis: f64,
) -> Option<&'a Keypoint> {
    if visible(left, min_vis) {
        Some(left)
    } else if visible(right, min_vis) {
        Some(right)
    } else {
        None
    }
}

pub(crate) fn distance(a: &Keypoint, b: &Keypoint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}
