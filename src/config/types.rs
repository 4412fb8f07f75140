use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Frame pacing for hosts that drive frames on a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Milliseconds between frames (default: 16).
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

/// Reconnecting transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// `host:port` to connect to. No transport is started when unset.
    #[serde(default)]
    pub url: Option<String>,
    /// Delay before the first reconnect, in milliseconds (default: 1000).
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    /// Upper bound for the reconnect delay, in milliseconds (default: 30000).
    #[serde(default = "default_max_reconnect_interval_ms")]
    pub max_reconnect_interval_ms: u64,
    /// Growth factor of the reconnect delay (default: 1.5).
    #[serde(default = "default_reconnect_decay")]
    pub reconnect_decay: f64,
    /// A connection attempt taking longer than this is abandoned, in
    /// milliseconds (default: 2000).
    #[serde(default = "default_timeout_interval_ms")]
    pub timeout_interval_ms: u64,
    /// Give up after this many consecutive failures. Unlimited when unset.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file. Defaults to `<data dir>/tealoop/<key>.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Snapshot name (default: "tealoop-todos").
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_reconnect_interval_ms() -> u64 {
    1000
}

fn default_max_reconnect_interval_ms() -> u64 {
    30_000
}

fn default_reconnect_decay() -> f64 {
    1.5
}

fn default_timeout_interval_ms() -> u64 {
    2000
}

fn default_storage_key() -> String {
    "tealoop-todos".to_string()
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl StorageConfig {
    /// Snapshot file to use: the configured path, or one derived from the
    /// key under the platform data directory.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => {
                let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
                data_dir.join("tealoop").join(format!("{}.json", self.key))
            }
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_interval_ms: default_max_reconnect_interval_ms(),
            reconnect_decay: default_reconnect_decay(),
            timeout_interval_ms: default_timeout_interval_ms(),
            max_reconnect_attempts: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
        }
    }
}
