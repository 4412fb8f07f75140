//! Runtime configuration (`config.toml`).

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{RenderConfig, RuntimeConfig, StorageConfig, TransportConfig};
