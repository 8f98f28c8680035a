use std::path::PathBuf;
use std::str::FromStr;

use fatigue_engine::{AlarmConfig, ClosedDurationMode, DetectionConfig, DEFAULT_FRAME_RATE};

pub const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "-" => InputSource::Stdin,
            path => InputSource::File(PathBuf::from(path)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub input: InputSource,
    pub alarm_cooldown_secs: f64,
    pub alarm_enabled: bool,
    pub assumed_fps: f64,
    pub measure_frame_interval: bool,
    pub webhook_url: Option<String>,
    pub status_log_every: u64,
    pub notify_queue: usize,
    /// Daily rolling log files go here; `None` keeps logging on the console.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            input: InputSource::Stdin,
            alarm_cooldown_secs: AlarmConfig::default().cooldown_s,
            alarm_enabled: true,
            assumed_fps: DEFAULT_FRAME_RATE,
            measure_frame_interval: false,
            webhook_url: None,
            status_log_every: 30,
            notify_queue: 16,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or malformed values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let alarm_cooldown_secs = parse_or(&lookup, "ALARM_COOLDOWN_SECS", defaults.alarm_cooldown_secs);
        let alarm_cooldown_secs = if alarm_cooldown_secs.is_finite() && alarm_cooldown_secs >= 0.0 {
            alarm_cooldown_secs
        } else {
            defaults.alarm_cooldown_secs
        };

        let assumed_fps = parse_or(&lookup, "ASSUMED_FPS", defaults.assumed_fps);
        let assumed_fps = if assumed_fps.is_finite() && assumed_fps > 0.0 {
            assumed_fps
        } else {
            defaults.assumed_fps
        };

        Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            input: lookup("FATIGUE_INPUT")
                .map(|v| InputSource::parse(&v))
                .unwrap_or(defaults.input),
            alarm_cooldown_secs,
            alarm_enabled: flag_or(&lookup, "ALARM_ENABLED", defaults.alarm_enabled),
            assumed_fps,
            measure_frame_interval: flag_or(&lookup, "MEASURE_FRAME_INTERVAL", defaults.measure_frame_interval),
            webhook_url: lookup("ALARM_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            status_log_every: parse_or(&lookup, "STATUS_LOG_EVERY", defaults.status_log_every).max(1),
            notify_queue: parse_or(&lookup, "ALARM_QUEUE_CAPACITY", defaults.notify_queue).max(1),
            log_dir: flag_or(&lookup, "ENABLE_FILE_LOGS", false).then(|| {
                lookup("LOG_DIR")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
            }),
        }
    }

    pub fn detection_config(&self) -> DetectionConfig {
        let closed_duration = if self.measure_frame_interval {
            ClosedDurationMode::Measured
        } else {
            ClosedDurationMode::Nominal {
                fps: self.assumed_fps,
            }
        };

        DetectionConfig {
            closed_duration,
            alarm: AlarmConfig {
                cooldown_s: self.alarm_cooldown_secs,
                enabled: self.alarm_enabled,
            },
            ..DetectionConfig::default()
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).as_deref().map(str::trim) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
