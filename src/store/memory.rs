//! In-memory store implementing every storage port.
//!
//! Backs tests and ephemeral sessions. Counts content writes and can be told to
//! fail writes, so persistence policies are observable.

use super::{Asset, ContentStore, FileContent, HandleStore, KeyValueStore};
use crate::error::StorageError;
use crate::types::{AssetId, NodeId};
use crate::writeback::ExternalFileHandle;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct MemoryStore {
    kv: RwLock<HashMap<String, String>>,
    contents: RwLock<HashMap<NodeId, FileContent>>,
    assets: RwLock<HashMap<AssetId, Asset>>,
    handles: RwLock<HashMap<NodeId, Arc<dyn ExternalFileHandle>>>,
    content_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put_content` calls so far.
    pub fn content_write_count(&self) -> usize {
        self.content_writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.kv.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.kv.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.kv.write().remove(key);
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_content(&self, file_id: &str) -> Result<Option<FileContent>, StorageError> {
        Ok(self.contents.read().get(file_id).cloned())
    }

    async fn put_content(&self, record: FileContent) -> Result<(), StorageError> {
        self.check_writable()?;
        self.contents.write().insert(record.file_id.clone(), record);
        self.content_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_content(&self, file_id: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.contents.write().remove(file_id);
        Ok(())
    }

    async fn list_content_ids(&self) -> Result<Vec<NodeId>, StorageError> {
        let mut ids: Vec<NodeId> = self.contents.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, StorageError> {
        Ok(self.assets.read().get(asset_id).cloned())
    }

    async fn put_asset(&self, asset: Asset) -> Result<(), StorageError> {
        self.check_writable()?;
        self.assets.write().insert(asset.id.clone(), asset);
        Ok(())
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.assets.write().remove(asset_id);
        Ok(())
    }

    async fn list_asset_ids(&self) -> Result<Vec<AssetId>, StorageError> {
        let mut ids: Vec<AssetId> = self.assets.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        self.contents.write().clear();
        self.assets.write().clear();
        self.handles.write().clear();
        Ok(())
    }
}

#[async_trait]
impl HandleStore for MemoryStore {
    async fn get_handle(
        &self,
        file_id: &str,
    ) -> Result<Option<Arc<dyn ExternalFileHandle>>, StorageError> {
        Ok(self.handles.read().get(file_id).cloned())
    }

    async fn put_handle(
        &self,
        file_id: &str,
        handle: Arc<dyn ExternalFileHandle>,
    ) -> Result<(), StorageError> {
        self.check_writable()?;
        self.handles.write().insert(file_id.to_string(), handle);
        Ok(())
    }

    async fn delete_handle(&self, file_id: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.handles.write().remove(file_id);
        Ok(())
    }

    async fn list_handle_ids(&self) -> Result<Vec<NodeId>, StorageError> {
        let mut ids: Vec<NodeId> = self.handles.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
