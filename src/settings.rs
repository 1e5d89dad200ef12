//! User settings record
//!
//! Stored as one JSON document in the key/value store and merged with defaults on
//! load: missing fields take their defaults, invalid fields are dropped one by one,
//! and fields this version does not know about are carried through on save.

use crate::error::StorageError;
use crate::store::{keys, KeyValueStore};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

pub const LEFT_WIDTH_RANGE: (f64, f64) = (200.0, 560.0);
pub const RIGHT_WIDTH_RANGE: (f64, f64) = (280.0, 980.0);
pub const MIN_CENTER_WIDTH: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            other => Err(format!("unknown theme mode '{}' (light, dark, system)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en")]
    En,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh-CN" => Ok(Language::ZhCn),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language '{}' (zh-CN, en)", other)),
        }
    }
}

/// Pane layout and tree expansion state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub left_width: f64,
    pub center_width: f64,
    pub right_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_folder_ids: Option<Vec<NodeId>>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            left_width: 260.0,
            center_width: 520.0,
            right_width: 420.0,
            expanded_folder_ids: None,
        }
    }
}

/// Pane widths as a single value, clamped to their allowed ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneWidths {
    pub left: f64,
    pub center: f64,
    pub right: f64,
}

impl PaneWidths {
    pub fn clamped(self) -> Self {
        Self {
            left: self.left.clamp(LEFT_WIDTH_RANGE.0, LEFT_WIDTH_RANGE.1),
            center: self.center.max(MIN_CENTER_WIDTH),
            right: self.right.clamp(RIGHT_WIDTH_RANGE.0, RIGHT_WIDTH_RANGE.1),
        }
    }
}

impl UiSettings {
    pub fn widths(&self) -> PaneWidths {
        PaneWidths {
            left: self.left_width,
            center: self.center_width,
            right: self.right_width,
        }
    }

    pub fn set_widths(&mut self, widths: PaneWidths) {
        let widths = widths.clamped();
        self.left_width = widths.left;
        self.center_width = widths.center;
        self.right_width = widths.right;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub include_header: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            include_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewSettings {
    pub ignore_frontmatter: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            ignore_frontmatter: true,
        }
    }
}

/// Full settings record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme_mode: ThemeMode,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_open_file_id: Option<NodeId>,
    pub ui: UiSettings,
    pub export: ExportSettings,
    pub preview: PreviewSettings,
    /// Shortcut overrides: action id to binding; an empty binding disables the action
    pub shortcuts: BTreeMap<String, String>,
    /// Fields written by other versions, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Parse a stored record, merging it field by field over the defaults.
    pub fn from_stored(raw: &str) -> Settings {
        let stored: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Settings record is unreadable, using defaults");
                return Settings::default();
            }
        };
        merge_with_defaults(stored)
    }
}

fn merge_with_defaults(stored: Value) -> Settings {
    let stored = match stored {
        Value::Object(map) => map,
        _ => {
            warn!("Settings record is not an object, using defaults");
            return Settings::default();
        }
    };
    let mut base = match serde_json::to_value(Settings::default()) {
        Ok(Value::Object(map)) => map,
        _ => return Settings::default(),
    };

    for (key, value) in stored {
        let mut candidate = base.clone();
        match candidate.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                candidate.insert(key.clone(), value);
            }
        }
        if serde_json::from_value::<Settings>(Value::Object(candidate.clone())).is_ok() {
            base = candidate;
        } else {
            warn!(key = %key, "Ignoring invalid settings field");
        }
    }

    serde_json::from_value(Value::Object(base)).unwrap_or_default()
}

fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Settings persistence over the key/value store
#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load settings; storage failures fall back to defaults.
    pub fn load(&self) -> Settings {
        match self.kv.get(keys::SETTINGS) {
            Ok(Some(raw)) => Settings::from_stored(&raw),
            Ok(None) => Settings::default(),
            Err(e) => {
                error!(error = %e, "Failed to read settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let raw = serde_json::to_string(settings)?;
        self.kv.set(keys::SETTINGS, &raw)
    }

    /// Read-modify-write against the stored record, so concurrent writers of
    /// unrelated fields do not clobber each other.
    pub fn update<F>(&self, apply: F) -> Result<Settings, StorageError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load();
        apply(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}
