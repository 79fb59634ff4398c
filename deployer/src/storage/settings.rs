//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DeployError;
use crate::logs::LogLevel;
use crate::stream::classifier::ClassifierSettings;

/// Environment variable overriding the settings file location
pub const SETTINGS_ENV: &str = "MINICI_SETTINGS";

/// Client settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Directory for a log file, none by default
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Build service configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Stream limits
    #[serde(default)]
    pub stream: StreamSettings,

    /// Log line classification
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Container keepalive
    #[serde(default)]
    pub keepalive: KeepaliveSettings,
}

impl Settings {
    /// Default location, `$HOME/.minici/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".minici").join("settings.json"))
    }

    /// Load settings
    ///
    /// An explicit path (argument, then `MINICI_SETTINGS`) must exist. A
    /// missing file at the default location yields the defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, DeployError> {
        let from_env = std::env::var_os(SETTINGS_ENV).map(PathBuf::from);
        if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
            return Self::read(&path).await;
        }

        match Self::default_path() {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
                Self::read(&path).await
            }
            _ => {
                debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    async fn read(path: &Path) -> Result<Self, DeployError> {
        debug!("Reading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DeployError::ConfigError(format!("Unable to read {}: {}", path.display(), e))
        })?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}

/// Build service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the build service
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    #[serde(default = "default_build_path")]
    pub build_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_ping_path")]
    pub ping_path: String,
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_build_path() -> String {
    build_api::BUILD_STREAM_PATH.to_string()
}

fn default_health_path() -> String {
    build_api::HEALTH_PATH.to_string()
}

fn default_ping_path() -> String {
    build_api::PING_PATH.to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            build_path: default_build_path(),
            health_path: default_health_path(),
            ping_path: default_ping_path(),
        }
    }
}

/// Stream limits; zero disables a limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_total_timeout() -> u64 {
    1800
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

/// Container keepalive settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_keepalive_interval() -> u64 {
    30
}

impl Default for KeepaliveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_keepalive_interval(),
        }
    }
}
