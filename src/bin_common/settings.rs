//! Real-time channel settings
//!
//! Loaded from YAML, with the endpoint overridable from the environment:
//!
//! ```yaml
//! url: wss://admin.example.edu/realtime
//! reconnect_interval_ms: 5000
//! max_reconnect_attempts: 5
//! connect_timeout_ms: 10000
//! log_level: info
//! subscriptions:
//!   - attendance.marked
//!   - fees.paid
//! ```

use realtime_channel::{ChannelClient, ChannelError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable that overrides `url`
pub const URL_ENV_VAR: &str = "REALTIME_WS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Failed to build client: {0}")]
    Client(#[from] ChannelError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// WebSocket endpoint; may be left empty in YAML and supplied via env
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: usize,
    /// Handshake timeout; none when absent
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Event types the monitor subscribes to
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

fn default_reconnect_interval_ms() -> u64 {
    5000
}

fn default_max_reconnect_attempts() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ChannelSettings {
    /// Load settings from a YAML file, apply `REALTIME_WS_URL`, validate
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let config = Self::from_yaml(&yaml_content)?
            .with_url_override(std::env::var(URL_ENV_VAR).ok());

        config.validate()?;
        Ok(config)
    }

    /// Parse without touching the environment or validating
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Replace the endpoint when `url` is a non-empty value
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            info!("Overriding endpoint URL from environment variable");
            self.url = url;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::EnvVarMissing(URL_ENV_VAR.to_string()));
        }

        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "url must use ws:// or wss://, got '{}'",
                self.url
            )));
        }

        if self.reconnect_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        if self.subscriptions.iter().any(|kind| kind.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "subscriptions must not contain empty event types".to_string(),
            ));
        }

        Ok(())
    }

    /// Build an unconnected client from these settings
    pub fn build_client(&self) -> Result<ChannelClient> {
        let builder = realtime_channel::builder()
            .url(self.url.clone())
            .reconnect_interval(Duration::from_millis(self.reconnect_interval_ms))
            .max_reconnect_attempts(self.max_reconnect_attempts);

        let builder = match self.connect_timeout_ms {
            Some(ms) => builder.connect_timeout(Duration::from_millis(ms)),
            None => builder,
        };

        Ok(builder.build()?)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Endpoint: {}", self.url);
        info!("  Reconnect interval: {} ms", self.reconnect_interval_ms);
        info!("  Max reconnect attempts: {}", self.max_reconnect_attempts);
        match self.connect_timeout_ms {
            Some(ms) => info!("  Connect timeout: {} ms", ms),
            None => info!("  Connect timeout: none"),
        }
        info!("  Log level: {}", self.log_level);
        info!("  Subscriptions: {}", self.subscriptions.join(", "));
    }
}
