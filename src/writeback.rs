//! External file write-back
//!
//! A note may be linked to a file on the user's disk. Edits are propagated to that
//! file on a best-effort basis: the content store is the source of truth, so every
//! failure here is logged at debug level and otherwise ignored.

use crate::store::HandleStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failure writing to an external file
#[derive(Debug, Error)]
pub enum WriteBackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Handle does not support writing")]
    Unsupported,
}

/// Capability to write to a file outside the workspace store.
///
/// Only the two operations write-back depends on are modelled; anything else the
/// host environment offers stays behind the implementation.
#[async_trait]
pub trait ExternalFileHandle: Send + Sync {
    /// Whether this handle can write at all.
    fn supports_write(&self) -> bool {
        true
    }

    /// Whether write permission is currently granted, without prompting.
    async fn check_permission(&self) -> bool;

    /// Ask for write permission. Hosts without a prompt just re-check.
    async fn request_permission(&self) -> bool {
        self.check_permission().await
    }

    /// Replace the external file's contents.
    async fn write(&self, text: &str) -> Result<(), WriteBackError>;

    /// Opaque token from which the handle can be recreated after a restart, if the
    /// backing environment allows it.
    fn persist_token(&self) -> Option<String> {
        None
    }

    /// Short human-readable description for logs and listings.
    fn describe(&self) -> String {
        "external handle".to_string()
    }
}

/// Handle to a plain file on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsFileHandle {
    path: PathBuf,
}

impl FsFileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Recreate a handle from its persisted token.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.is_empty() {
            return None;
        }
        Some(Self::new(token))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExternalFileHandle for FsFileHandle {
    async fn check_permission(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.is_file() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    /// A missing target is created empty. Write-back itself only re-checks, so a file
    /// deleted after linking is not recreated.
    async fn request_permission(&self) -> bool {
        if self.check_permission().await {
            return true;
        }
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await;
        match created {
            Ok(_) => self.check_permission().await,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Cannot create link target");
                false
            }
        }
    }

    async fn write(&self, text: &str) -> Result<(), WriteBackError> {
        tokio::fs::write(&self.path, text.as_bytes()).await?;
        Ok(())
    }

    fn persist_token(&self) -> Option<String> {
        Some(self.path.to_string_lossy().to_string())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Result of a write-back attempt. Every variant except `Written` is a silent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBackOutcome {
    Written,
    NoHandle,
    Unsupported,
    PermissionDenied,
    Failed,
}

/// Write `text` to the disk file linked to `file_id`, if any.
pub async fn write_back(handles: &dyn HandleStore, file_id: &str, text: &str) -> WriteBackOutcome {
    let handle = match handles.get_handle(file_id).await {
        Ok(Some(handle)) => handle,
        Ok(None) => return WriteBackOutcome::NoHandle,
        Err(e) => {
            debug!(file_id, error = %e, "Handle lookup failed, skipping write-back");
            return WriteBackOutcome::NoHandle;
        }
    };

    if !handle.supports_write() {
        debug!(file_id, "Linked handle is read-only, skipping write-back");
        return WriteBackOutcome::Unsupported;
    }

    if !handle.check_permission().await {
        debug!(file_id, target = %handle.describe(), "Write permission not granted");
        return WriteBackOutcome::PermissionDenied;
    }

    match handle.write(text).await {
        Ok(()) => {
            debug!(file_id, target = %handle.describe(), bytes = text.len(), "Wrote back to disk");
            WriteBackOutcome::Written
        }
        Err(e) => {
            debug!(file_id, target = %handle.describe(), error = %e, "Write-back failed");
            WriteBackOutcome::Failed
        }
    }
}
