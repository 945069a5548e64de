//! Configuration management for micro hosts

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Base paths and timing for the feature cache clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub main_base_url: String,
    pub payments_base_url: String,
    pub support_base_url: String,
    /// humantime duration, e.g. "30s"
    pub request_timeout: String,
    /// humantime duration, e.g. "60s"
    pub keep_unused_for: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Append the action logger middleware to every composed store
    pub log_actions: bool,
    /// Buffer size of the store event bus
    pub event_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            main_base_url: "/api".to_string(),
            payments_base_url: "/api/payments".to_string(),
            support_base_url: "/api/support".to_string(),
            request_timeout: "30s".to_string(),
            keep_unused_for: "60s".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_actions: true,
            event_capacity: 100,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration("api.request_timeout", &self.request_timeout)
    }

    pub fn keep_unused_for(&self) -> Result<Duration> {
        parse_duration("api.keep_unused_for", &self.keep_unused_for)
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if no
    /// file exists there
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        // Surface bad durations at load time rather than at first request
        config.api.request_timeout()?;
        config.api.keep_unused_for()?;

        Ok(config)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|_| {
        ConfigError::InvalidDuration {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Resolve the configuration file path (XDG config dir unless overridden)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("MICRO_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("micro").join("config.toml"))
}
