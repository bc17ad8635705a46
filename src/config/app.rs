use anyhow::{Context, Result};
use chrono::Duration;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::thresholds::ExerciseThresholds;

/// Read `key` from the environment, using `default` when unset.
///
/// A set but unparseable value is an error rather than a silent fallback.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub environment: String,
    pub log_level: String,
    pub pose: PoseConfig,
    pub alerts: AlertConfig,
    pub replay: ReplayConfig,
    pub thresholds: ExerciseThresholds,
}

/// Pose estimator and camera settings
#[derive(Debug, Clone, PartialEq)]
pub struct PoseConfig {
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
    pub camera_index: u32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            camera_index: 0,
        }
    }
}

/// Alert cooldown, display and audio settings
#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub cooldown_secs: u64,
    pub display_secs: u64,
    pub audio_dir: PathBuf,
    pub queue_capacity: usize,
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.cooldown_secs as i64)
    }

    pub fn display_duration(&self) -> Duration {
        Duration::seconds(self.display_secs as i64)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 5,
            display_secs: 3,
            audio_dir: PathBuf::from("static/audio"),
            queue_capacity: 16,
        }
    }
}

/// Skeleton recording replayed in place of a live camera
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub path: Option<PathBuf>,
    pub fps: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { path: None, fps: 30 }
    }
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("PORT", 5000u16)?;
        let debug = env_flag("DEBUG", true);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| if debug { "debug" } else { "info" }.to_string());

        let pose = PoseConfig {
            min_detection_confidence: env_or("MIN_DETECTION_CONFIDENCE", 0.5)?,
            min_tracking_confidence: env_or("MIN_TRACKING_CONFIDENCE", 0.5)?,
            camera_index: env_or("CAMERA_INDEX", 0u32)?,
        };

        let alerts = AlertConfig {
            cooldown_secs: env_or("AUDIO_COOLDOWN", 5u64)?,
            display_secs: env_or("ERROR_DISPLAY_TIME", 3u64)?,
            audio_dir: env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static/audio")),
            queue_capacity: env_or("ALERT_QUEUE_CAPACITY", 16usize)?.max(1),
        };

        let replay = ReplayConfig {
            path: env::var("REPLAY_PATH").ok().map(PathBuf::from),
            fps: env_or("REPLAY_FPS", 30u32)?.max(1),
        };

        Ok(Self {
            host,
            port,
            debug,
            environment,
            log_level,
            pose,
            alerts,
            replay,
            thresholds: ExerciseThresholds::from_env()?,
        })
    }

    /// Get server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            pose: PoseConfig::default(),
            alerts: AlertConfig::default(),
            replay: ReplayConfig::default(),
            thresholds: ExerciseThresholds::default(),
        }
    }
}
