//! Idle/Calibrating/Monitoring state machine.
//!
//! `DetectionSession` owns every per-session accumulator and is the only
//! place transitions happen. It is synchronous and clock-injected; the async
//! runtime feeds it frames and commands.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{to_datetime, Clock};
use crate::engine::alerting::AlertScheduler;
use crate::engine::config::DetectionConfig;
use crate::engine::persistence::IssueTracker;
use crate::engine::{calibration, evaluate, smoothing, viewpoint};
use crate::error::EngineError;
use crate::types::{
    CalibrationProfile, FrameUpdate, KeypointFrame, SessionResult, SessionState, SessionStats,
    Settings, TimelineEntry, ViewMode,
};

pub struct DetectionSession {
    config: DetectionConfig,
    clock: Arc<dyn Clock>,
    state: SessionState,
    smoothed: Option<KeypointFrame>,
    view_mode: Option<ViewMode>,
    pose_in_guide: bool,
    calibration: Option<CalibrationProfile>,
    frame_count: u64,
    tracker: IssueTracker,
    alerts: AlertScheduler,
    stats: SessionStats,
    timeline: VecDeque<TimelineEntry>,
    session_start_ms: Option<i64>,
    last_break_ms: Option<i64>,
}

impl DetectionSession {
    pub fn new(config: DetectionConfig, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            state: SessionState::Idle,
            smoothed: None,
            view_mode: None,
            pose_in_guide: false,
            calibration: None,
            frame_count: 0,
            tracker: IssueTracker::new(),
            alerts: AlertScheduler::new(),
            stats: SessionStats::default(),
            timeline: VecDeque::new(),
            session_start_ms: None,
            last_break_ms: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn view_mode(&self) -> Option<ViewMode> {
        self.view_mode
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Idle -> Calibrating. No baseline exists yet; frames now drive viewpoint
    /// classification and guide alignment.
    pub fn start_calibration(&mut self) -> Result<(), EngineError> {
        if self.state != SessionState::Idle {
            return Err(EngineError::InvalidState {
                expected: "idle",
                actual: self.state,
            });
        }
        self.state = SessionState::Calibrating;
        info!("calibration started");
        Ok(())
    }

    /// Feeds one detector output (or a detection miss) and returns the
    /// per-frame report. Never transitions state.
    pub fn process_frame(&mut self, frame: Option<KeypointFrame>, settings: &Settings) -> FrameUpdate {
        match self.state {
            SessionState::Idle => FrameUpdate::idle(SessionState::Idle),
            SessionState::Calibrating => self.calibrating_frame(frame),
            SessionState::Monitoring => self.monitoring_frame(frame, settings),
        }
    }

    fn calibrating_frame(&mut self, frame: Option<KeypointFrame>) -> FrameUpdate {
        let Some(frame) = frame else {
            // Subject lost: alignment is void but the last classified view
            // survives for when they step back in.
            self.pose_in_guide = false;
            let mut update = FrameUpdate::idle(SessionState::Calibrating);
            update.view_mode = self.view_mode;
            return update;
        };

        let smoothed = smoothing::smooth(&frame, self.smoothed.as_ref(), self.config.smoothing_alpha);
        self.view_mode = Some(viewpoint::classify(&smoothed, &self.config));
        self.pose_in_guide =
            calibration::pose_in_guide(&smoothed, &self.config.guide, self.config.min_visibility);
        self.smoothed = Some(smoothed);

        let mut update = FrameUpdate::idle(SessionState::Calibrating);
        update.view_mode = self.view_mode;
        update.pose_in_guide = self.pose_in_guide;
        update
    }

    fn monitoring_frame(&mut self, frame: Option<KeypointFrame>, settings: &Settings) -> FrameUpdate {
        let now = self.clock.now_ms();
        let Some(frame) = frame else {
            self.pose_in_guide = false;
            let mut update = FrameUpdate::idle(SessionState::Monitoring);
            update.view_mode = self.view_mode;
            update.break_due = self.break_check(now, settings);
            return update;
        };
        let Some(profile) = self.calibration.as_ref() else {
            return FrameUpdate::idle(SessionState::Monitoring);
        };

        let smoothed = smoothing::smooth(&frame, self.smoothed.as_ref(), self.config.smoothing_alpha);
        let result = evaluate::evaluate(
            &smoothed,
            profile,
            &self.config,
            settings.clamped_sensitivity(),
        );
        self.pose_in_guide =
            calibration::pose_in_guide(&smoothed, &self.config.guide, self.config.min_visibility);
        self.smoothed = Some(smoothed);
        self.frame_count += 1;

        if self.frame_count % self.config.stats_interval_frames == 0 {
            if result.status.is_good() {
                self.stats.good_ticks += 1;
            } else {
                self.stats.bad_ticks += 1;
            }
            let confirmed =
                self.tracker
                    .observe(&result.issues, now, self.config.issue_min_duration_ms);
            for label in confirmed {
                *self.stats.issue_counts.entry(label).or_insert(0) += 1;
                debug!(issue = label.as_str(), "issue confirmed");
            }
        }

        if self.frame_count % self.config.timeline_interval_frames == 0 {
            if self.timeline.len() == self.config.max_timeline_entries {
                self.timeline.pop_front();
            }
            self.timeline.push_back(TimelineEntry {
                timestamp: to_datetime(now),
                status: result.status,
                issues: result.issues.clone(),
            });
        }

        // The counter and the cooldown stamp advance on every fire; the
        // enabled flag gates only notification delivery.
        let fired = self.alerts.on_status(
            result.status,
            now,
            settings.alert_delay_secs,
            self.config.alert_cooldown_ms,
        );
        if fired {
            self.stats.alert_count += 1;
        }
        let dispatched = fired && settings.alert_enabled;
        if dispatched {
            info!(status = ?result.status, "posture alert dispatched");
        }

        FrameUpdate {
            state: SessionState::Monitoring,
            status: result.status,
            issues: result.issues,
            view_mode: self.view_mode,
            pose_in_guide: self.pose_in_guide,
            alert_fired: dispatched,
            break_due: self.break_check(now, settings),
            metrics: result.metrics,
        }
    }

    fn break_check(&mut self, now: i64, settings: &Settings) -> bool {
        if settings.break_interval_min == 0 {
            return false;
        }
        let Some(last) = self.last_break_ms else {
            return false;
        };
        if now - last >= settings.break_interval_min as i64 * 60_000 {
            self.last_break_ms = Some(now);
            true
        } else {
            false
        }
    }

    /// Calibrating -> Monitoring. Captures the baseline from the current
    /// smoothed frame; all counters start from zero here.
    pub fn complete_calibration(&mut self) -> Result<ViewMode, EngineError> {
        if self.state != SessionState::Calibrating {
            return Err(EngineError::InvalidState {
                expected: "calibrating",
                actual: self.state,
            });
        }
        if !self.pose_in_guide {
            return Err(EngineError::Calibration("pose is not aligned with the guide"));
        }
        let frame = self
            .smoothed
            .as_ref()
            .ok_or(EngineError::Calibration("no pose captured yet"))?;
        let mode = self
            .view_mode
            .ok_or(EngineError::Calibration("viewpoint not classified yet"))?;

        let profile = calibration::build(frame, mode, &self.config)?;
        self.calibration = Some(profile);
        self.state = SessionState::Monitoring;
        self.frame_count = 0;
        self.tracker.clear();
        self.alerts.clear();
        self.stats = SessionStats::default();
        self.timeline.clear();
        let now = self.clock.now_ms();
        self.session_start_ms = Some(now);
        self.last_break_ms = Some(now);
        info!(view_mode = mode.as_str(), "monitoring started");
        Ok(mode)
    }

    /// Monitoring -> Calibrating. Drops the baseline and every accumulator;
    /// the in-progress session is discarded, not finalized.
    pub fn recalibrate(&mut self) -> Result<(), EngineError> {
        if self.state != SessionState::Monitoring {
            return Err(EngineError::InvalidState {
                expected: "monitoring",
                actual: self.state,
            });
        }
        self.state = SessionState::Calibrating;
        self.calibration = None;
        self.view_mode = None;
        self.smoothed = None;
        self.pose_in_guide = false;
        self.frame_count = 0;
        self.tracker.clear();
        self.alerts.clear();
        self.stats = SessionStats::default();
        self.timeline.clear();
        self.session_start_ms = None;
        self.last_break_ms = None;
        info!("recalibration started");
        Ok(())
    }

    /// Monitoring -> Idle. Finalizes and returns the session summary.
    pub fn finish(&mut self) -> Result<SessionResult, EngineError> {
        if self.state != SessionState::Monitoring {
            return Err(EngineError::InvalidState {
                expected: "monitoring",
                actual: self.state,
            });
        }
        let now = self.clock.now_ms();
        let start = self.session_start_ms.take();
        let duration = start.map_or(0, |s| ((now - s).max(0) / 1_000) as u64);

        let good = self.stats.good_ticks;
        let bad = self.stats.bad_ticks;
        let good_percentage = if good + bad == 0 {
            0
        } else {
            (good as f64 / (good + bad) as f64 * 100.0).round() as u32
        };

        let mode = self
            .calibration
            .as_ref()
            .map(CalibrationProfile::view_mode)
            .ok_or(EngineError::Calibration("no calibration profile"))?;

        let result = SessionResult {
            id: Uuid::new_v4(),
            duration,
            good_time: good,
            bad_time: bad,
            alerts: self.stats.alert_count,
            good_percentage,
            issue_count: std::mem::take(&mut self.stats.issue_counts),
            view_mode: mode,
            timestamp: to_datetime(now),
            start_time: start.map(to_datetime),
            timeline: self.timeline.drain(..).collect(),
        };

        self.state = SessionState::Idle;
        self.calibration = None;
        self.view_mode = None;
        self.smoothed = None;
        self.pose_in_guide = false;
        self.frame_count = 0;
        self.tracker.clear();
        self.alerts.clear();
        self.stats = SessionStats::default();
        self.last_break_ms = None;
        info!(
            duration_secs = result.duration,
            good_percentage = result.good_percentage,
            "session finished"
        );
        Ok(result)
    }
}

/// Newest-first ring of completed session results, capped in memory.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: VecDeque<SessionResult>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, result: SessionResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(result);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::{
        LEFT_EAR, LEFT_EYE, LEFT_SHOULDER, MAX_HISTORY_ENTRIES, NOSE, RIGHT_EAR, RIGHT_EYE,
        RIGHT_SHOULDER,
    };
    use crate::engine::evaluate::testutil::{blank, frame, set};
    use crate::types::PostureStatus;

    fn session_with_clock(clock: &ManualClock) -> DetectionSession {
        DetectionSession::new(DetectionConfig::default(), Arc::new(clock.clone())).unwrap()
    }

    /// Frontal pose with the left shoulder inside the default guide band.
    fn front_frame(shoulder_y: f64) -> KeypointFrame {
        let mut p = blank();
        set(&mut p, NOSE, 0.50, 0.30, 0.9);
        set(&mut p, LEFT_EYE, 0.47, 0.28, 0.9);
        set(&mut p, RIGHT_EYE, 0.53, 0.28, 0.9);
        set(&mut p, LEFT_EAR, 0.44, 0.30, 0.9);
        set(&mut p, RIGHT_EAR, 0.56, 0.30, 0.9);
        set(&mut p, LEFT_SHOULDER, 0.37, shoulder_y, 0.9);
        set(&mut p, RIGHT_SHOULDER, 0.63, shoulder_y, 0.9);
        frame(p)
    }

    fn calibrate(session: &mut DetectionSession, settings: &Settings) {
        session.start_calibration().unwrap();
        for _ in 0..40 {
            session.process_frame(Some(front_frame(0.45)), settings);
        }
        assert_eq!(session.complete_calibration().unwrap(), ViewMode::Front);
    }

    #[test]
    fn transitions_enforce_state() {
        let clock = ManualClock::new(0);
        let mut session = session_with_clock(&clock);
        assert!(session.complete_calibration().is_err());
        assert!(session.finish().is_err());
        session.start_calibration().unwrap();
        assert!(session.start_calibration().is_err());
    }

    #[test]
    fn idle_frames_are_inert() {
        let clock = ManualClock::new(0);
        let mut session = session_with_clock(&clock);
        let update = session.process_frame(Some(front_frame(0.45)), &Settings::default());
        assert_eq!(update.state, SessionState::Idle);
        assert!(!update.pose_in_guide);
    }

    #[test]
    fn calibration_classifies_and_aligns() {
        let clock = ManualClock::new(0);
        let mut session = session_with_clock(&clock);
        session.start_calibration().unwrap();
        let update = session.process_frame(Some(front_frame(0.45)), &Settings::default());
        assert_eq!(update.view_mode, Some(ViewMode::Front));
        assert!(update.pose_in_guide);
        session.complete_calibration().unwrap();
        assert_eq!(session.state(), SessionState::Monitoring);
    }

    #[test]
    fn complete_calibration_requires_guide_alignment() {
        let clock = ManualClock::new(0);
        let mut session = session_with_clock(&clock);
        session.start_calibration().unwrap();
        // Shoulders above the guide band.
        session.process_frame(Some(front_frame(0.20)), &Settings::default());
        assert!(session.complete_calibration().is_err());
        assert_eq!(session.state(), SessionState::Calibrating);
    }

    #[test]
    fn lost_subject_voids_alignment_but_keeps_view() {
        let clock = ManualClock::new(0);
        let mut session = session_with_clock(&clock);
        session.start_calibration().unwrap();
        session.process_frame(Some(front_frame(0.45)), &Settings::default());
        let update = session.process_frame(None, &Settings::default());
        assert_eq!(update.view_mode, Some(ViewMode::Front));
        assert!(!update.pose_in_guide);
        assert!(session.complete_calibration().is_err());
    }

    #[test]
    fn monitoring_accumulates_good_ticks() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);

        for _ in 0..9 {
            clock.advance(66);
            let update = session.process_frame(Some(front_frame(0.45)), &settings);
            assert_eq!(update.status, PostureStatus::Good);
        }
        assert_eq!(session.stats().good_ticks, 3);
        assert_eq!(session.stats().bad_ticks, 0);
    }

    #[test]
    fn sustained_issue_reaches_stats_once() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);

        // Dropped shoulders for four seconds of frames. Smoothing converges
        // fast enough that drop exceeds the threshold well within a second.
        for _ in 0..60 {
            clock.advance(66);
            session.process_frame(Some(front_frame(0.55)), &settings);
        }
        assert_eq!(
            session.stats().issue_counts.get(&crate::types::IssueLabel::Slouching),
            Some(&1)
        );
    }

    #[test]
    fn recalibrate_discards_accumulators() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);
        for _ in 0..9 {
            clock.advance(66);
            session.process_frame(Some(front_frame(0.45)), &settings);
        }
        session.recalibrate().unwrap();
        assert_eq!(session.state(), SessionState::Calibrating);
        assert_eq!(session.stats().good_ticks, 0);
        assert_eq!(session.view_mode(), None);
    }

    #[test]
    fn finish_summarizes_and_resets() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);

        for _ in 0..9 {
            clock.advance(66);
            session.process_frame(Some(front_frame(0.45)), &settings);
        }
        clock.set(60_000);
        let result = session.finish().unwrap();
        assert_eq!(result.duration, 60);
        assert_eq!(result.good_time, 3);
        assert_eq!(result.bad_time, 0);
        assert_eq!(result.good_percentage, 100);
        assert_eq!(result.view_mode, ViewMode::Front);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn finish_with_no_ticks_reports_zero_percentage() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);
        let result = session.finish().unwrap();
        assert_eq!(result.good_percentage, 0);
    }

    #[test]
    fn break_reminder_fires_on_interval() {
        let clock = ManualClock::new(0);
        let settings = Settings {
            break_interval_min: 1,
            ..Settings::default()
        };
        let mut session = session_with_clock(&clock);
        calibrate(&mut session, &settings);

        clock.set(59_000);
        let update = session.process_frame(Some(front_frame(0.45)), &settings);
        assert!(!update.break_due);
        clock.set(60_000);
        let update = session.process_frame(Some(front_frame(0.45)), &settings);
        assert!(update.break_due);
        // Interval restarts from the reminder.
        clock.set(61_000);
        let update = session.process_frame(Some(front_frame(0.45)), &settings);
        assert!(!update.break_due);
    }

    #[test]
    fn history_caps_and_orders_newest_first() {
        let clock = ManualClock::new(0);
        let settings = Settings::default();
        let mut history = SessionHistory::new(MAX_HISTORY_ENTRIES);
        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            let mut session = session_with_clock(&clock);
            calibrate(&mut session, &settings);
            clock.advance(i as i64 * 1_000 + 1_000);
            history.push(session.finish().unwrap());
        }
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        let newest = history.iter().next().unwrap();
        let oldest = history.iter().last().unwrap();
        assert!(newest.timestamp >= oldest.timestamp);
    }
}
