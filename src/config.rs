use std::env;
use std::str::FromStr;

use crate::engine::config::DetectionConfig;
use crate::types::Settings;

/// Process-level configuration for the replay binary and runtime wiring.
/// Detection thresholds live in [`DetectionConfig`]; this only carries the
/// knobs that make sense as environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub detection_fps: u32,
    pub sensitivity: f64,
    pub alert_delay_secs: u64,
    pub alert_enabled: bool,
    pub break_interval_min: u64,
    /// JSONL keypoint capture consumed by the replay binary.
    pub replay_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            detection_fps: env_or_parse("UPRIGHT_DETECTION_FPS", 15_u32),
            sensitivity: env_or_parse("UPRIGHT_SENSITIVITY", 1.0_f64),
            alert_delay_secs: env_or_parse("UPRIGHT_ALERT_DELAY_SECS", 3_u64),
            alert_enabled: env_or_bool("UPRIGHT_ALERT_ENABLED", true),
            break_interval_min: env_or_parse("UPRIGHT_BREAK_INTERVAL_MIN", 30_u64),
            replay_path: env::var("UPRIGHT_REPLAY_PATH").ok(),
        }
    }

    pub fn detection(&self) -> DetectionConfig {
        DetectionConfig {
            detection_fps: self.detection_fps,
            ..DetectionConfig::default()
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            sensitivity: self.sensitivity.clamp(0.5, 2.0),
            alert_delay_secs: self.alert_delay_secs,
            alert_enabled: self.alert_enabled,
            break_interval_min: self.break_interval_min,
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
