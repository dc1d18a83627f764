//! Configuration loading for pagecraft.
//!
//! Configuration is read from a TOML file passed with `--config`. Every
//! section and field is optional.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use pagecraft_deploy::DeployConfig;
use pagecraft_sync::SessionConfig;
use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Save timing.
    pub sync: SyncSection,
    /// Hosting provider access.
    pub deploy: DeploySection,
    /// Log output.
    pub logging: LoggingSection,
}

/// Save timing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SyncSection {
    /// Quiet period after the last edit before saving (default: 2000).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Periodic flush interval in seconds (default: 30).
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

/// Hosting provider access.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeploySection {
    /// Base URL of a SHA-256 file-digest hosting API. Required unless
    /// deploying with `--mock`.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Environment variable holding the API token (default: PAGECRAFT_HOST_TOKEN).
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Files uploaded at once (default: 4).
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    /// Delay between status polls in milliseconds (default: 1000).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Status polls before giving up (default: 30).
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

/// Log output.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_debounce_ms() -> u64 {
    2000
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_token_env() -> String {
    "PAGECRAFT_HOST_TOKEN".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_concurrency() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_polls() -> u32 {
    30
}

fn default_log_filter() -> String {
    "warn,pagecraft_deploy=info,pagecraft_sync=info".to_string()
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            api_base: None,
            token_env: default_token_env(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_concurrency: default_upload_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        content.parse().map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Session timing for the sync layer.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_debounce(Duration::from_millis(self.sync.debounce_ms))
            .with_flush_interval(Duration::from_secs(self.sync.flush_interval_secs))
    }

    /// Deploy client settings.
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig::default()
            .with_request_timeout(Duration::from_secs(self.deploy.request_timeout_secs))
            .with_upload_concurrency(self.deploy.upload_concurrency)
            .with_poll_interval(Duration::from_millis(self.deploy.poll_interval_ms))
            .with_max_polls(self.deploy.max_polls)
    }
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        toml::from_str(content)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse the configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}
