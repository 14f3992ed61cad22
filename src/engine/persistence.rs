use std::collections::HashMap;

use crate::types::IssueLabel;

/// Debounces raw per-frame issues so a label only counts once it has been
/// present continuously for the configured minimum duration.
#[derive(Debug, Default)]
pub struct IssueTracker {
    started_at: HashMap<IssueLabel, i64>,
    confirmed: Vec<IssueLabel>,
}

impl IssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one frame's issue set and returns the labels that crossed the
    /// persistence threshold on this call. Each sustained stretch of an issue
    /// is reported exactly once; an issue that vanishes is forgotten
    /// immediately and must re-earn the full duration.
    pub fn observe(
        &mut self,
        issues: &[IssueLabel],
        now_ms: i64,
        min_duration_ms: i64,
    ) -> Vec<IssueLabel> {
        self.started_at.retain(|label, _| issues.contains(label));
        self.confirmed.retain(|label| issues.contains(label));

        let mut newly_confirmed = Vec::new();
        for &label in issues {
            let started = *self.started_at.entry(label).or_insert(now_ms);
            if now_ms - started >= min_duration_ms && !self.confirmed.contains(&label) {
                self.confirmed.push(label);
                newly_confirmed.push(label);
            }
        }
        newly_confirmed
    }

    pub fn clear(&mut self) {
        self.started_at.clear();
        self.confirmed.clear();
    }
}
