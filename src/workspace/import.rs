//! Import of notes from the local filesystem.

use super::facade::{Workspace, DEFAULT_IMPORT_FOLDER_NAME};
use super::types::{ImportEntry, ImportFile, ImportSummary};
use crate::error::ApiError;
use crate::tree::naming::is_supported_import_file;
use crate::writeback::{ExternalFileHandle, FsFileHandle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

impl Workspace {
    /// Import a file or a directory tree from disk next to the selection.
    ///
    /// With `link` set, each imported note keeps a handle to its source file so edits
    /// are written back. Hidden entries are skipped, as are files that are not valid
    /// UTF-8.
    pub async fn import_path(
        &mut self,
        selected: Option<&str>,
        path: &Path,
        link: bool,
    ) -> Result<ImportSummary, ApiError> {
        let path = dunce::canonicalize(path).map_err(|e| {
            ApiError::InvalidArgument(format!("cannot import {}: {}", path.display(), e))
        })?;

        if path.is_file() {
            let name = file_name(&path);
            if !is_supported_import_file(&name) {
                return Err(ApiError::InvalidArgument(format!(
                    "not a Markdown or text file: {}",
                    path.display()
                )));
            }
            let text = read_text(&path).await.ok_or_else(|| {
                ApiError::InvalidArgument(format!("unreadable file: {}", path.display()))
            })?;
            let file = ImportFile {
                name,
                text,
                handle: link.then(|| fs_handle(&path)),
            };
            return self.import_files(selected, vec![file]).await;
        }

        let entries = collect_entries(&path, link).await;
        let folder_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_IMPORT_FOLDER_NAME.to_string());
        self.import_folder(selected, &folder_name, entries).await
    }
}

async fn collect_entries(root: &Path, link: bool) -> Vec<ImportEntry> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_supported_import_file(&file_name(entry.path())) {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => continue,
        };
        let Some(text) = read_text(entry.path()).await else {
            continue;
        };
        debug!(path = %relative, "Queued for import");
        entries.push(ImportEntry {
            relative_path: relative,
            text,
            handle: link.then(|| fs_handle(entry.path())),
        });
    }
    entries
}

async fn read_text(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping file that cannot be read as text");
            None
        }
    }
}

fn fs_handle(path: &Path) -> Arc<dyn ExternalFileHandle> {
    Arc::new(FsFileHandle::new(path))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
