//! Sled-backed store
//!
//! One database with a tree per record class. Key/value records are stored as JSON
//! text, content and asset records as bincode.

use super::{Asset, ContentStore, FileContent, HandleStore, KeyValueStore};
use crate::error::StorageError;
use crate::types::{AssetId, NodeId};
use crate::writeback::{ExternalFileHandle, FsFileHandle};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const KV_TREE: &str = "kv";
const CONTENTS_TREE: &str = "file_contents";
const ASSETS_TREE: &str = "assets";
const HANDLES_TREE: &str = "local_file_handles";

/// Persisted form of a handle: only the environment-specific token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HandleRecord {
    file_id: NodeId,
    token: String,
}

pub struct SledStore {
    db: sled::Db,
    kv: sled::Tree,
    contents: sled::Tree,
    assets: sled::Tree,
    handles: sled::Tree,
    /// Handles without a persist token live for this session only
    session_handles: RwLock<HashMap<NodeId, Arc<dyn ExternalFileHandle>>>,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        debug!(path = %path.display(), "Opened workspace database");
        Self::from_db(db)
    }

    /// Throwaway database removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            kv: db.open_tree(KV_TREE)?,
            contents: db.open_tree(CONTENTS_TREE)?,
            assets: db.open_tree(ASSETS_TREE)?,
            handles: db.open_tree(HANDLES_TREE)?,
            db,
            session_handles: RwLock::new(HashMap::new()),
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

fn list_keys(tree: &sled::Tree) -> Result<Vec<String>, StorageError> {
    let mut ids = Vec::new();
    for key in tree.iter().keys() {
        let key = key?;
        ids.push(String::from_utf8_lossy(&key).to_string());
    }
    Ok(ids)
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.kv.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| StorageError::Corrupt(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.kv.remove(key.as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SledStore {
    async fn get_content(&self, file_id: &str) -> Result<Option<FileContent>, StorageError> {
        match self.contents.get(file_id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_content(&self, record: FileContent) -> Result<(), StorageError> {
        let bytes = bincode::serialize(&record)?;
        self.contents.insert(record.file_id.as_bytes(), bytes)?;
        Ok(())
    }

    async fn delete_content(&self, file_id: &str) -> Result<(), StorageError> {
        self.contents.remove(file_id.as_bytes())?;
        Ok(())
    }

    async fn list_content_ids(&self) -> Result<Vec<NodeId>, StorageError> {
        list_keys(&self.contents)
    }

    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, StorageError> {
        match self.assets.get(asset_id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_asset(&self, asset: Asset) -> Result<(), StorageError> {
        let bytes = bincode::serialize(&asset)?;
        self.assets.insert(asset.id.as_bytes(), bytes)?;
        Ok(())
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), StorageError> {
        self.assets.remove(asset_id.as_bytes())?;
        Ok(())
    }

    async fn list_asset_ids(&self) -> Result<Vec<AssetId>, StorageError> {
        list_keys(&self.assets)
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.contents.clear()?;
        self.assets.clear()?;
        self.handles.clear()?;
        self.session_handles.write().clear();
        Ok(())
    }
}

#[async_trait]
impl HandleStore for SledStore {
    async fn get_handle(
        &self,
        file_id: &str,
    ) -> Result<Option<Arc<dyn ExternalFileHandle>>, StorageError> {
        if let Some(handle) = self.session_handles.read().get(file_id) {
            return Ok(Some(Arc::clone(handle)));
        }
        let bytes = match self.handles.get(file_id.as_bytes())? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let record: HandleRecord = serde_json::from_slice(&bytes)?;
        match FsFileHandle::from_token(&record.token) {
            Some(handle) => Ok(Some(Arc::new(handle))),
            None => {
                warn!(file_id, "Stored handle token cannot be restored");
                Ok(None)
            }
        }
    }

    async fn put_handle(
        &self,
        file_id: &str,
        handle: Arc<dyn ExternalFileHandle>,
    ) -> Result<(), StorageError> {
        match handle.persist_token() {
            Some(token) => {
                let record = HandleRecord {
                    file_id: file_id.to_string(),
                    token,
                };
                self.handles
                    .insert(file_id.as_bytes(), serde_json::to_vec(&record)?)?;
                self.session_handles.write().remove(file_id);
            }
            None => {
                self.handles.remove(file_id.as_bytes())?;
                self.session_handles
                    .write()
                    .insert(file_id.to_string(), handle);
            }
        }
        Ok(())
    }

    async fn delete_handle(&self, file_id: &str) -> Result<(), StorageError> {
        self.handles.remove(file_id.as_bytes())?;
        self.session_handles.write().remove(file_id);
        Ok(())
    }

    async fn list_handle_ids(&self) -> Result<Vec<NodeId>, StorageError> {
        let mut ids = list_keys(&self.handles)?;
        ids.extend(self.session_handles.read().keys().cloned());
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
