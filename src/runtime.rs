//! Cancellable real-time detection loop.
//!
//! `Monitor` owns a [`DetectionSession`] on a spawned task and drives it at
//! the configured detection cadence. Collaborators are injected as trait
//! objects; a failure in any one of them skips the frame, never the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::engine::config::DetectionConfig;
use crate::engine::session::DetectionSession;
use crate::error::EngineError;
use crate::types::{FrameUpdate, KeypointFrame, SessionResult, Settings, ViewMode};

/// Produces one keypoint frame per tick; `None` means no subject detected.
pub trait PerceptionEngine: Send + Sync {
    fn detect(&self, timestamp_ms: i64) -> Result<Option<KeypointFrame>, EngineError>;
}

/// Receives every per-frame report, typically for an overlay or UI feed.
pub trait RenderSink: Send + Sync {
    fn render(&self, update: &FrameUpdate);
}

/// Receives the alerts the session decided to dispatch.
pub trait NotificationSink: Send + Sync {
    fn posture_alert(&self);
    fn break_reminder(&self);
}

/// Source of the live tunables; re-read every tick so changes apply without a
/// restart.
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> Settings;
}

enum Command {
    CompleteCalibration(oneshot::Sender<Result<ViewMode, EngineError>>),
    Recalibrate(oneshot::Sender<Result<(), EngineError>>),
    Finish(oneshot::Sender<Result<SessionResult, EngineError>>),
}

struct LoopParts {
    session: DetectionSession,
    perception: Arc<dyn PerceptionEngine>,
    renderer: Arc<dyn RenderSink>,
    notifier: Arc<dyn NotificationSink>,
    settings: Arc<dyn SettingsProvider>,
    clock: Arc<dyn Clock>,
    interval_ms: i64,
    commands: mpsc::Receiver<Command>,
    shutdown: broadcast::Receiver<()>,
}

pub struct Monitor {
    parts: Option<LoopParts>,
    commands: mpsc::Sender<Command>,
    shutdown: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: DetectionConfig,
        clock: Arc<dyn Clock>,
        perception: Arc<dyn PerceptionEngine>,
        renderer: Arc<dyn RenderSink>,
        notifier: Arc<dyn NotificationSink>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Result<Self, EngineError> {
        let interval_ms = config.detection_interval_ms();
        let mut session = DetectionSession::new(config, Arc::clone(&clock))?;
        session.start_calibration()?;

        let (command_tx, command_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        Ok(Self {
            parts: Some(LoopParts {
                session,
                perception,
                renderer,
                notifier,
                settings,
                clock,
                interval_ms,
                commands: command_rx,
                shutdown: shutdown_rx,
            }),
            commands: command_tx,
            shutdown: shutdown_tx,
            handle: None,
        })
    }

    /// Spawns the detection loop. Calling again while running is a no-op.
    pub fn start(&mut self) {
        let Some(parts) = self.parts.take() else {
            return;
        };
        info!(interval_ms = parts.interval_ms, "detection loop starting");
        self.handle = Some(tokio::spawn(run_loop(parts)));
    }

    /// Signals shutdown and waits for the loop task to drain.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.shutdown.send(());
        if let Err(err) = handle.await {
            warn!(error = %err, "detection loop task panicked");
        }
        info!("detection loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub async fn complete_calibration(&self) -> Result<ViewMode, EngineError> {
        self.request(Command::CompleteCalibration).await
    }

    pub async fn recalibrate(&self) -> Result<(), EngineError> {
        self.request(Command::Recalibrate).await
    }

    pub async fn finish(&self) -> Result<SessionResult, EngineError> {
        self.request(Command::Finish).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> Command,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| EngineError::NotRunning)?;
        rx.await.map_err(|_| EngineError::NotRunning)?
    }
}

async fn run_loop(mut parts: LoopParts) {
    let mut ticker = tokio::time::interval(Duration::from_millis(parts.interval_ms.max(1) as u64));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = parts.shutdown.recv() => break,
            command = parts.commands.recv() => {
                match command {
                    Some(Command::CompleteCalibration(reply)) => {
                        let _ = reply.send(parts.session.complete_calibration());
                    }
                    Some(Command::Recalibrate(reply)) => {
                        let _ = reply.send(parts.session.recalibrate());
                    }
                    Some(Command::Finish(reply)) => {
                        let _ = reply.send(parts.session.finish());
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                tick(&mut parts);
            }
        }
    }
}

fn tick(parts: &mut LoopParts) {
    let now = parts.clock.now_ms();
    let frame = match parts.perception.detect(now) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "perception failed, skipping frame");
            return;
        }
    };

    let settings = parts.settings.current();
    let update = parts.session.process_frame(frame, &settings);
    if update.alert_fired {
        parts.notifier.posture_alert();
    }
    if update.break_due {
        parts.notifier.break_reminder();
    }
    parts.renderer.render(&update);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::clock::SystemClock;
    use crate::types::SessionState;

    struct NoSubject;
    impl PerceptionEngine for NoSubject {
        fn detect(&self, _timestamp_ms: i64) -> Result<Option<KeypointFrame>, EngineError> {
            Ok(None)
        }
    }

    struct FlakyPerception {
        calls: AtomicU64,
    }
    impl PerceptionEngine for FlakyPerception {
        fn detect(&self, _timestamp_ms: i64) -> Result<Option<KeypointFrame>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Collaborator("camera disconnected".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<FrameUpdate>>,
    }
    impl RenderSink for RecordingSink {
        fn render(&self, update: &FrameUpdate) {
            self.updates.lock().unwrap().push(update.clone());
        }
    }

    struct SilentNotifier;
    impl NotificationSink for SilentNotifier {
        fn posture_alert(&self) {}
        fn break_reminder(&self) {}
    }

    struct FixedSettings;
    impl SettingsProvider for FixedSettings {
        fn current(&self) -> Settings {
            Settings::default()
        }
    }

    fn fast_config() -> DetectionConfig {
        let mut config = DetectionConfig::default();
        config.detection_fps = 500;
        config
    }

    fn monitor_with(perception: Arc<dyn PerceptionEngine>, sink: Arc<RecordingSink>) -> Monitor {
        Monitor::new(
            fast_config(),
            Arc::new(SystemClock),
            perception,
            sink,
            Arc::new(SilentNotifier),
            Arc::new(FixedSettings),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn loop_renders_updates_and_stops() {
        let sink = Arc::new(RecordingSink::default());
        let mut monitor = monitor_with(Arc::new(NoSubject), Arc::clone(&sink));
        monitor.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        monitor.stop().await;

        let updates = sink.updates.lock().unwrap();
        assert!(!updates.is_empty());
        assert!(updates
            .iter()
            .all(|u| u.state == SessionState::Calibrating));
    }

    #[tokio::test]
    async fn start_twice_spawns_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut monitor = monitor_with(Arc::new(NoSubject), Arc::clone(&sink));
        monitor.start();
        assert!(monitor.is_running());
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop().await;
        assert!(!monitor.is_running());
        monitor.stop().await;
    }

    #[tokio::test]
    async fn perception_errors_do_not_kill_the_loop() {
        let perception = Arc::new(FlakyPerception {
            calls: AtomicU64::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let mut monitor = monitor_with(Arc::clone(&perception) as Arc<dyn PerceptionEngine>, sink);
        monitor.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.is_running());
        monitor.stop().await;
        assert!(perception.calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn commands_reach_the_session() {
        let sink = Arc::new(RecordingSink::default());
        let mut monitor = monitor_with(Arc::new(NoSubject), Arc::clone(&sink));
        monitor.start();
        // No subject was ever detected, so calibration cannot complete.
        let result = monitor.complete_calibration().await;
        assert!(result.is_err());
        monitor.stop().await;
    }
}
