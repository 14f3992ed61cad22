//! Offline replay runner.
//!
//! Reads a JSONL keypoint capture, runs the full calibrate/monitor pipeline
//! over it with a manually driven clock, and prints the finalized session
//! summary as JSON.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use upright::clock::ManualClock;
use upright::config::Config;
use upright::engine::session::DetectionSession;
use upright::error::EngineError;
use upright::logging::{init_tracing, LogConfig};
use upright::types::{Keypoint, KeypointFrame, SessionState};

/// One captured detector output. Records without a timestamp advance the
/// clock by one detection interval.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayRecord {
    timestamp_ms: Option<i64>,
    landmarks: Vec<Keypoint>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });

    let Some(path) = config.replay_path.clone() else {
        eprintln!("UPRIGHT_REPLAY_PATH is not set; nothing to replay");
        return ExitCode::FAILURE;
    };

    match replay(&config, &path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("replay failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn replay(config: &Config, path: &str) -> Result<(), EngineError> {
    let detection = config.detection();
    let interval_ms = detection.detection_interval_ms();
    let settings = config.settings();

    let clock = ManualClock::new(0);
    let mut session = DetectionSession::new(detection, Arc::new(clock.clone()))?;
    session.start_calibration()?;

    let reader = BufReader::new(File::open(path)?);
    let mut calibrated = false;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                warn!(line = line_no + 1, error = %err, "skipping malformed record");
                continue;
            }
        };

        match record.timestamp_ms {
            Some(ts) => clock.set(ts),
            None => clock.advance(interval_ms),
        }
        let frame = match KeypointFrame::new(record.landmarks) {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!(line = line_no + 1, error = %err, "skipping bad frame");
                None
            }
        };

        let update = session.process_frame(frame, &settings);
        if !calibrated && update.pose_in_guide && update.view_mode.is_some() {
            let mode = session.complete_calibration()?;
            info!(view_mode = mode.as_str(), "calibrated from capture");
            calibrated = true;
        }
    }

    if session.state() != SessionState::Monitoring {
        return Err(EngineError::Calibration(
            "capture never produced a guide-aligned pose",
        ));
    }
    let result = session.finish()?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
