//! Shared types for workspace operations and status.

use crate::settings::Settings;
use crate::store::{ContentStore, HandleStore, KeyValueStore};
use crate::tree::TreeState;
use crate::types::{AssetId, NodeId};
use crate::writeback::ExternalFileHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The three storage ports a workspace runs on.
#[derive(Clone)]
pub struct WorkspaceStores {
    pub kv: Arc<dyn KeyValueStore>,
    pub content: Arc<dyn ContentStore>,
    pub handles: Arc<dyn HandleStore>,
}

impl WorkspaceStores {
    /// All three ports served by one backend.
    pub fn single<S>(store: Arc<S>) -> Self
    where
        S: KeyValueStore + ContentStore + HandleStore + 'static,
    {
        Self {
            kv: store.clone(),
            content: store.clone(),
            handles: store,
        }
    }
}

/// What bootstrap produced. `current_file_id` always names a file node in `tree`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceBootstrap {
    pub settings: Settings,
    pub tree: TreeState,
    pub current_file_id: NodeId,
    pub origin: BootstrapOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapOrigin {
    /// No usable tree was stored; a seeded one was created.
    FirstRun,
    /// The stored tree was loaded and had a file to open.
    Resumed,
    /// The stored tree had no files; an empty one was created to open.
    CreatedFallbackFile,
}

/// A file handed to import: display name, text, and an optional disk link.
#[derive(Clone)]
pub struct ImportFile {
    pub name: String,
    pub text: String,
    pub handle: Option<Arc<dyn ExternalFileHandle>>,
}

/// A file inside an imported folder, addressed by its `/`-separated relative path.
#[derive(Clone)]
pub struct ImportEntry {
    pub relative_path: String,
    pub text: String,
    pub handle: Option<Arc<dyn ExternalFileHandle>>,
}

/// Nodes created by an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<NodeId>,
    pub file_ids: Vec<NodeId>,
    pub skipped: Vec<String>,
}

/// Result of deleting a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Every removed node, pre-order from the deleted node
    pub deleted_ids: Vec<NodeId>,
    /// File ids whose content was purged
    pub purged_files: Vec<NodeId>,
    pub purged_assets: Vec<AssetId>,
    /// File opened in place of a deleted current file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopened: Option<NodeId>,
}

/// Records removed by an orphan sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub contents: Vec<NodeId>,
    pub handles: Vec<NodeId>,
    pub assets: Vec<AssetId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.handles.is_empty() && self.assets.is_empty()
    }

    pub fn total(&self) -> usize {
        self.contents.len() + self.handles.len() + self.assets.len()
    }
}

/// Snapshot for the `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    pub data_dir: String,
    pub root_name: String,
    pub folders: usize,
    pub files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    pub linked_files: usize,
    pub assets: usize,
    pub theme: String,
    pub language: String,
    pub integrity_issues: Vec<String>,
}
