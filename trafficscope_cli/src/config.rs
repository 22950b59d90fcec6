//! CLI configuration management

use crate::units::DurationUnit;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trafficscope_common::constants::DEFAULT_POLL_INTERVAL_MS;

/// Fallback dashboard address when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080/";

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trafficscope")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trafficscope")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Get the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    let config = config_dir();
    let logs = logs_dir();

    fs::create_dir_all(&config).context("Failed to create config directory")?;
    fs::create_dir_all(&logs).context("Failed to create logs directory")?;

    Ok(())
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dashboard URL (default: http://127.0.0.1:8080/)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Sync cadence in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Unit of the collector's `duration` field
    #[serde(default)]
    pub duration_unit: DurationUnit,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            duration_unit: DurationUnit::default(),
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file())
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        // An empty file is valid and means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Server URL, with an explicit override taking precedence
    pub fn server_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.server_url)
            .to_string()
    }

    /// Sync cadence, never shorter than 100ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
