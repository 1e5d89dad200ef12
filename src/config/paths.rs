//! XDG base directories for configuration and data.

use crate::error::ApiError;
use std::path::PathBuf;

const APP_DIR: &str = "markdesk";

/// `$XDG_DATA_HOME`, otherwise `$HOME/.local/share`
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, otherwise `$HOME/.config`
pub fn config_home() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/markdesk/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Default database directory: `<data dir>/markdesk/workspace`.
///
/// Uses the platform data directory from `directories`, then the XDG fallback.
pub fn default_data_dir() -> Result<PathBuf, ApiError> {
    if let Some(dirs) = directories::ProjectDirs::from("", "", APP_DIR) {
        return Ok(dirs.data_dir().join("workspace"));
    }
    data_home()
        .map(|home| home.join(APP_DIR).join("workspace"))
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine data directory (HOME not set)".to_string(),
            )
        })
}
