//! Storage ports
//!
//! Three independent stores back a workspace:
//! - a small synchronous key/value store for the settings and tree records,
//! - an asynchronous blob-capable store for file content and pasted assets,
//! - a handle store associating file ids with external disk handles.
//!
//! There is no cross-store transaction. The workspace orchestrator sequences writes
//! and purges content itself when nodes are deleted.

pub mod memory;
pub mod persistence;

use crate::error::StorageError;
use crate::tree::TreeState;
use crate::types::{AssetId, NodeId, Timestamp};
use crate::writeback::ExternalFileHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Record keys inside the key/value store
pub mod keys {
    pub const SETTINGS: &str = "markdesk.settings";
    pub const TREE: &str = "markdesk.tree";
    /// Raw copy of a tree record that could not be parsed
    pub const TREE_BACKUP: &str = "markdesk.tree.corrupt";
}

/// Text body of a file node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub file_id: NodeId,
    pub content: String,
    pub updated_at: Timestamp,
}

/// Binary attachment referenced from note text by URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub mime: String,
    pub data: Vec<u8>,
    pub created_at: Timestamp,
}

/// Synchronous key/value port for small JSON records
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Asynchronous port for file content and assets
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_content(&self, file_id: &str) -> Result<Option<FileContent>, StorageError>;
    async fn put_content(&self, record: FileContent) -> Result<(), StorageError>;
    async fn delete_content(&self, file_id: &str) -> Result<(), StorageError>;
    async fn list_content_ids(&self) -> Result<Vec<NodeId>, StorageError>;

    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, StorageError>;
    async fn put_asset(&self, asset: Asset) -> Result<(), StorageError>;
    async fn delete_asset(&self, asset_id: &str) -> Result<(), StorageError>;
    async fn list_asset_ids(&self) -> Result<Vec<AssetId>, StorageError>;

    /// Drop every content, asset and handle record.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Port for external disk handles, keyed by file id
#[async_trait]
pub trait HandleStore: Send + Sync {
    async fn get_handle(
        &self,
        file_id: &str,
    ) -> Result<Option<Arc<dyn ExternalFileHandle>>, StorageError>;
    async fn put_handle(
        &self,
        file_id: &str,
        handle: Arc<dyn ExternalFileHandle>,
    ) -> Result<(), StorageError>;
    async fn delete_handle(&self, file_id: &str) -> Result<(), StorageError>;
    async fn list_handle_ids(&self) -> Result<Vec<NodeId>, StorageError>;
}

/// Contents of the tree record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRecord {
    Missing,
    Valid(TreeState),
    /// Present but unparseable or rootless; carries the raw text.
    Unreadable(String),
}

/// Read and classify the persisted tree record.
pub fn read_tree(kv: &dyn KeyValueStore) -> Result<TreeRecord, StorageError> {
    let raw = match kv.get(keys::TREE)? {
        Some(raw) => raw,
        None => return Ok(TreeRecord::Missing),
    };
    match serde_json::from_str::<TreeState>(&raw) {
        Ok(tree) if tree.root().is_some() => Ok(TreeRecord::Valid(tree)),
        Ok(tree) => {
            error!(root_id = %tree.root_id, "Persisted tree has no root node");
            Ok(TreeRecord::Unreadable(raw))
        }
        Err(e) => {
            error!(error = %e, "Persisted tree is unreadable");
            Ok(TreeRecord::Unreadable(raw))
        }
    }
}

/// Load the persisted tree. Missing and unreadable records both read as `None`.
pub fn load_tree(kv: &dyn KeyValueStore) -> Result<Option<TreeState>, StorageError> {
    Ok(match read_tree(kv)? {
        TreeRecord::Valid(tree) => Some(tree),
        TreeRecord::Missing | TreeRecord::Unreadable(_) => None,
    })
}

/// Keep an unreadable tree record under [`keys::TREE_BACKUP`].
///
/// An existing backup is never overwritten, so the oldest damaged record wins.
/// Returns whether `raw` was stored.
pub fn back_up_tree(kv: &dyn KeyValueStore, raw: &str) -> Result<bool, StorageError> {
    if kv.get(keys::TREE_BACKUP)?.is_some() {
        warn!("A tree backup already exists, keeping it");
        return Ok(false);
    }
    kv.set(keys::TREE_BACKUP, raw)?;
    Ok(true)
}

/// Whether a backed-up tree record is waiting for recovery.
pub fn has_tree_backup(kv: &dyn KeyValueStore) -> Result<bool, StorageError> {
    Ok(kv.get(keys::TREE_BACKUP)?.is_some())
}

/// Persist the tree as a single JSON record.
pub fn save_tree(kv: &dyn KeyValueStore, tree: &TreeState) -> Result<(), StorageError> {
    let raw = serde_json::to_string(tree)?;
    kv.set(keys::TREE, &raw)
}

/// Read a file's text. A missing record reads as empty text.
pub async fn load_text(content: &dyn ContentStore, file_id: &str) -> Result<String, StorageError> {
    Ok(content
        .get_content(file_id)
        .await?
        .map(|record| record.content)
        .unwrap_or_default())
}
