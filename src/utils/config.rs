use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reveal::RevealTiming;
use crate::utils::error::{ChatError, ChatResult};

const CONFIG_DIR: &str = ".greenchoice";
const CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const ENDPOINT_ENV: &str = "GREENCHOICE_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the question service
    pub endpoint: String,

    pub request_timeout_secs: u64,

    pub reveal: RevealConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub enabled: bool,
    pub char_interval_ms: u64,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            reveal: RevealConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            char_interval_ms: 13,
            settle_delay_ms: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ChatResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ChatResult<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `~/.greenchoice`, or `./.greenchoice` when there is no home directory
    pub fn get_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join(CONFIG_FILE)
    }

    /// Load `path` if it exists, otherwise defaults.
    ///
    /// A file that exists but cannot be parsed is an error rather than being
    /// silently replaced.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Apply `GREENCHOICE_ENDPOINT` if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> ChatResult<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            ChatError::Config(format!("endpoint '{}' is not a valid URL: {}", self.endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ChatError::Config(format!(
                "endpoint '{}' must be an http(s) URL with a host",
                self.endpoint
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ChatError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.reveal.char_interval_ms == 0 {
            return Err(ChatError::Config(
                "reveal.char_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ChatError::Config(format!(
                "unknown logging level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reveal_timing(&self) -> RevealTiming {
        RevealTiming {
            char_interval: Duration::from_millis(self.reveal.char_interval_ms),
            settle_delay: Duration::from_millis(self.reveal.settle_delay_ms),
        }
    }

    /// Path of the stored placeholder profile
    pub fn profile_path() -> PathBuf {
        Self::get_config_dir().join("user.json")
    }

    /// Path of the input history file
    pub fn history_path() -> PathBuf {
        Self::get_config_dir().join("history.txt")
    }
}
