use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default storage key, shared with the browser build's localStorage key
pub const DEFAULT_STORAGE_KEY: &str = "todoApp";

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; `None` = platform default
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_key")]
    pub key: String,
    /// Pretty-print the stored JSON
    #[serde(default)]
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            dir: None,
            key: default_key(),
            pretty: false,
        }
    }
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter for env_logger; RUST_LOG wins when set
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}
