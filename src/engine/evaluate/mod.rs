//! Per-viewpoint posture evaluation strategies.
//!
//! Every strategy implements the same contract: compare live geometry against
//! the stored baseline, append an issue label when the absolute deviation
//! exceeds `base_threshold * sensitivity`, and let the status derive from the
//! issue count. A missing required landmark short-circuits to good/no-issues
//! with a diagnostic marker.

pub mod back;
pub mod diagonal;
pub mod front;
pub mod side;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::engine::config::DetectionConfig;
use crate::types::{CalibrationProfile, EvaluationResult, KeypointFrame, ViewMode};

pub trait ViewEvaluator: Send + Sync {
    fn evaluate(
        &self,
        frame: &KeypointFrame,
        profile: &CalibrationProfile,
        config: &DetectionConfig,
        sensitivity: f64,
    ) -> EvaluationResult;
}

/// Strategy map keyed by viewpoint. A new viewpoint is supported by adding an
/// entry here, not by widening a switch somewhere else.
static EVALUATORS: Lazy<HashMap<ViewMode, Box<dyn ViewEvaluator>>> = Lazy::new(|| {
    let mut map: HashMap<ViewMode, Box<dyn ViewEvaluator>> = HashMap::new();
    map.insert(ViewMode::Front, Box::new(front::FrontEvaluator));
    map.insert(ViewMode::Side, Box::new(side::SideEvaluator));
    map.insert(ViewMode::Diagonal, Box::new(diagonal::DiagonalEvaluator));
    map.insert(ViewMode::Back, Box::new(back::BackEvaluator));
    map
});

pub fn evaluate(
    frame: &KeypointFrame,
    profile: &CalibrationProfile,
    config: &DetectionConfig,
    sensitivity: f64,
) -> EvaluationResult {
    match EVALUATORS.get(&profile.view_mode()) {
        Some(evaluator) => evaluator.evaluate(frame, profile, config, sensitivity),
        None => EvaluationResult::skipped("no evaluator for view mode"),
    }
}
