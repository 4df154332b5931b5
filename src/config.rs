//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//!
//! The one setting that matters most is `[remote] base_url`: present and
//! non-empty selects remote mode, absent selects local mode entirely.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::RemoteConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub poll: PollSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSection {
    /// Base URL of the REST API. Absent or empty selects local mode.
    pub base_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Local store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("tripboard").to_string_lossy().to_string())
        .unwrap_or_else(|| "./tripboard_data".to_string())
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Poller configuration (remote mode only)
#[derive(Debug, Clone, Deserialize)]
pub struct PollSection {
    #[serde(default = "default_messages_secs")]
    pub messages_secs: u64,

    #[serde(default = "default_attendees_secs")]
    pub attendees_secs: u64,
}

fn default_messages_secs() -> u64 {
    5
}

fn default_attendees_secs() -> u64 {
    10
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            messages_secs: default_messages_secs(),
            attendees_secs: default_attendees_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tripboard").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TRIPBOARD_REMOTE_URL") {
            self.remote.base_url = Some(url);
        }
        if let Ok(data_dir) = std::env::var("TRIPBOARD_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Ok(level) = std::env::var("TRIPBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TRIPBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// The remote backend configuration, if remote mode is selected.
    ///
    /// An empty or whitespace-only `base_url` counts as absent, so an
    /// unset deployment variable cannot half-select remote mode.
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        let base_url = self.remote.base_url.as_deref()?.trim();
        if base_url.is_empty() {
            return None;
        }
        Some(RemoteConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: self.remote.request_timeout_ms,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tripboard Configuration
#
# Environment variables override these settings:
# - TRIPBOARD_REMOTE_URL
# - TRIPBOARD_DATA_DIR
# - TRIPBOARD_LOG_LEVEL
# - TRIPBOARD_LOG_FORMAT

[remote]
# Base URL of the trip API. Leave empty (or omit) to keep chat and RSVPs
# on this machine only.
# base_url = "https://api.example.com/prod"

# Request timeout (ms)
request_timeout_ms = 5000

[storage]
# Directory for the local profile (identity, visitor id, local records)
# data_dir = "~/.local/share/tripboard"

[poll]
# How often remote mode re-fetches the chat log (seconds)
messages_secs = 5

# How often remote mode re-fetches attendee lists (seconds)
attendees_secs = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
