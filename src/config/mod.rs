//! Application configuration
//!
//! Layered with the `config` crate. Precedence, lowest first: built-in defaults, the
//! global file (`$XDG_CONFIG_HOME/markdesk/config.toml`), an explicit `--config` file,
//! and `MARKDESK__SECTION__KEY` environment variables.

mod facade;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Full application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub save: SaveConfig,
}

/// Where workspace data lives
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; None means the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database directory, falling back to the platform default.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ApiError> {
        match &self.data_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.clone()),
            _ => paths::default_data_dir(),
        }
    }
}

/// Debounce windows in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    #[serde(default = "default_content_debounce_ms")]
    pub content_debounce_ms: u64,

    #[serde(default = "default_write_back_debounce_ms")]
    pub write_back_debounce_ms: u64,

    #[serde(default = "default_pane_width_debounce_ms")]
    pub pane_width_debounce_ms: u64,

    #[serde(default = "default_expanded_debounce_ms")]
    pub expanded_debounce_ms: u64,
}

fn default_content_debounce_ms() -> u64 {
    450
}

fn default_write_back_debounce_ms() -> u64 {
    900
}

fn default_pane_width_debounce_ms() -> u64 {
    200
}

fn default_expanded_debounce_ms() -> u64 {
    120
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            content_debounce_ms: default_content_debounce_ms(),
            write_back_debounce_ms: default_write_back_debounce_ms(),
            pane_width_debounce_ms: default_pane_width_debounce_ms(),
            expanded_debounce_ms: default_expanded_debounce_ms(),
        }
    }
}
