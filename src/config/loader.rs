use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::RuntimeConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl RuntimeConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/tealoop/config.toml` on Unix/macOS, or the
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("tealoop").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `RuntimeConfig::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(RuntimeConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RuntimeConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Frame interval is non-zero
    /// - Reconnect decay is at least 1.0
    /// - Max reconnect interval is not below the base interval
    /// - Connection timeout is non-zero
    /// - Storage key is not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.frame_interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "render.frame_interval_ms must be greater than 0".to_string(),
            });
        }

        let transport = &self.transport;
        if transport.reconnect_decay.is_nan() || transport.reconnect_decay < 1.0 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "transport.reconnect_decay must be at least 1.0, got {}",
                    transport.reconnect_decay
                ),
            });
        }

        if transport.max_reconnect_interval_ms < transport.reconnect_interval_ms {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "transport.max_reconnect_interval_ms ({}) is below reconnect_interval_ms ({})",
                    transport.max_reconnect_interval_ms, transport.reconnect_interval_ms
                ),
            });
        }

        if transport.timeout_interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "transport.timeout_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "storage.key must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
