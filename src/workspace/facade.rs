//! Workspace orchestrator
//!
//! Owns the current tree, settings, expanded folders and open file, and sequences
//! every user-level operation across the tree model and the three stores. In-memory
//! state always changes first; persistence follows and its failures are logged, not
//! returned. Structural errors from the tree model are returned untouched.

use super::bootstrap::bootstrap;
use super::types::{
    BootstrapOrigin, DeleteOutcome, ImportEntry, ImportFile, ImportSummary, SweepReport,
    WorkspaceStatus, WorkspaceStores,
};
use crate::assets::{self, DEFAULT_ASSET_MIME};
use crate::config::SaveConfig;
use crate::error::{ApiError, TreeError};
use crate::save::{Clock, LayoutPersister, SaveCoordinator, SaveReport, SaveTimings, SystemClock};
use crate::settings::{Language, PaneWidths, Settings, SettingsStore, ThemeMode};
use crate::shortcuts;
use crate::store::{self, keys, Asset, FileContent};
use crate::tree::naming::{ensure_extension, ensure_unique_child_name, MARKDOWN_EXTENSION};
use crate::tree::integrity;
use crate::tree::traversal::{first_file_id, node_path};
use crate::tree::{Node, TreeState};
use crate::types::{new_id, now_millis, AssetId, NodeId};
use crate::writeback::{ExternalFileHandle, WriteBackOutcome};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Folder name used when an imported folder has none
pub const DEFAULT_IMPORT_FOLDER_NAME: &str = "Imported";

/// Construction options
#[derive(Clone)]
pub struct WorkspaceOptions {
    pub save: SaveConfig,
    pub clock: Arc<dyn Clock>,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            save: SaveConfig::default(),
            clock: Arc::new(SystemClock::new()),
        }
    }
}

pub struct Workspace {
    stores: WorkspaceStores,
    settings_store: SettingsStore,
    saves: Arc<SaveCoordinator>,
    layout: LayoutPersister,
    tree: TreeState,
    settings: Settings,
    expanded: BTreeSet<NodeId>,
    current_file_id: Option<NodeId>,
    origin: BootstrapOrigin,
}

impl Workspace {
    /// Bootstrap a workspace with default timings and the system clock.
    pub async fn open(stores: WorkspaceStores) -> Result<Self, ApiError> {
        Self::open_with(stores, WorkspaceOptions::default()).await
    }

    /// Bootstrap a workspace. A resumed workspace is swept for orphaned records.
    pub async fn open_with(
        stores: WorkspaceStores,
        options: WorkspaceOptions,
    ) -> Result<Self, ApiError> {
        let settings_store = SettingsStore::new(stores.kv.clone());
        let boot = bootstrap(&stores, &settings_store).await?;

        let saves = Arc::new(SaveCoordinator::new(
            stores.content.clone(),
            stores.handles.clone(),
            options.clock.clone(),
            SaveTimings::from(&options.save),
        ));
        let layout =
            LayoutPersister::from_config(settings_store.clone(), options.clock, &options.save);

        let mut expanded: BTreeSet<NodeId> = boot
            .settings
            .ui
            .expanded_folder_ids
            .iter()
            .flatten()
            .filter(|id| boot.tree.is_folder(id))
            .cloned()
            .collect();
        expanded.insert(boot.tree.root_id.clone());
        expanded.extend(boot.tree.ancestor_folder_ids(&boot.current_file_id));

        let workspace = Self {
            stores,
            settings_store,
            saves,
            layout,
            tree: boot.tree,
            settings: boot.settings,
            expanded,
            current_file_id: Some(boot.current_file_id),
            origin: boot.origin,
        };

        if workspace.origin != BootstrapOrigin::FirstRun {
            match workspace.sweep_orphans().await {
                Ok(report) if !report.is_empty() => {
                    info!(removed = report.total(), "Swept orphaned records");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Orphan sweep failed"),
            }
        }
        Ok(workspace)
    }

    pub fn tree(&self) -> &TreeState {
        &self.tree
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_file_id(&self) -> Option<&str> {
        self.current_file_id.as_deref()
    }

    pub fn origin(&self) -> BootstrapOrigin {
        self.origin
    }

    pub fn stores(&self) -> &WorkspaceStores {
        &self.stores
    }

    pub fn is_expanded(&self, folder_id: &str) -> bool {
        self.expanded.contains(folder_id)
    }

    pub fn expanded_folder_ids(&self) -> Vec<NodeId> {
        self.expanded.iter().cloned().collect()
    }

    /// Shared handle to the save coordinator, e.g. for [`crate::save::spawn_driver`].
    pub fn save_coordinator(&self) -> Arc<SaveCoordinator> {
        self.saves.clone()
    }

    /// Counts and integrity findings for the `status` command.
    pub async fn status(&self, data_dir: &str) -> Result<WorkspaceStatus, ApiError> {
        let files = self.tree.file_ids().len();
        let mut integrity_issues: Vec<String> = integrity::validate(&self.tree)
            .iter()
            .map(|issue| issue.to_string())
            .collect();
        if store::has_tree_backup(self.stores.kv.as_ref())? {
            integrity_issues.push(format!(
                "unreadable tree record kept under {}; orphan cleanup is disabled",
                keys::TREE_BACKUP
            ));
        }
        Ok(WorkspaceStatus {
            data_dir: data_dir.to_string(),
            root_name: self
                .tree
                .root()
                .map(|root| root.name.clone())
                .unwrap_or_default(),
            folders: self.tree.len() - files,
            files,
            current_file: self
                .current_file_id
                .as_deref()
                .and_then(|id| node_path(&self.tree, id)),
            linked_files: self.stores.handles.list_handle_ids().await?.len(),
            assets: self.stores.content.list_asset_ids().await?.len(),
            theme: format!("{:?}", self.settings.theme_mode).to_lowercase(),
            language: format!("{:?}", self.settings.language),
            integrity_issues,
        })
    }

    // --- Files ---

    /// Make `file_id` the open file and return its text.
    pub async fn open_file(&mut self, file_id: &str) -> Result<String, ApiError> {
        self.require_file(file_id)?;

        self.expanded.insert(self.tree.root_id.clone());
        self.expanded
            .extend(self.tree.ancestor_folder_ids(file_id));
        self.persist_expanded();

        self.current_file_id = Some(file_id.to_string());
        let id = file_id.to_string();
        self.update_settings(move |s| s.last_open_file_id = Some(id.clone()));

        self.load_text(file_id).await
    }

    /// Stored text of a file; a missing record reads as empty.
    pub async fn load_text(&self, file_id: &str) -> Result<String, ApiError> {
        self.require_file(file_id)?;
        Ok(store::load_text(self.stores.content.as_ref(), file_id).await?)
    }

    /// Record an edit; it is committed once the file goes quiet.
    pub fn edit(&self, file_id: &str, text: impl Into<String>) -> Result<(), ApiError> {
        self.require_file(file_id)?;
        self.saves.on_edit(file_id, text);
        Ok(())
    }

    /// Commit due saves and layout changes.
    pub async fn tick(&self) -> SaveReport {
        self.layout.tick();
        self.saves.tick().await
    }

    /// Commit everything pending now.
    pub async fn flush(&self) -> SaveReport {
        self.layout.flush();
        self.saves.flush().await
    }

    // --- Structure ---

    /// Create a file next to the selection and open it.
    ///
    /// `.md` is appended when the name has no extension, and a ` (n)` suffix keeps it
    /// unique among its siblings.
    pub async fn new_file(
        &mut self,
        selected: Option<&str>,
        name: &str,
    ) -> Result<NodeId, ApiError> {
        let name = non_empty_name(name)?;
        let parent_id = self.tree.resolve_parent_folder_id(selected);
        let name = ensure_unique_child_name(
            &self.tree,
            &parent_id,
            &ensure_extension(name, MARKDOWN_EXTENSION),
        );

        let (tree, id) = self.tree.create_file(&parent_id, &name, now_millis())?;
        self.commit_tree(tree);
        self.expanded.insert(parent_id);
        self.persist_expanded();

        self.write_content(&id, "").await;
        self.open_file(&id).await?;
        info!(file_id = %id, name = %name, "File created");
        Ok(id)
    }

    /// Create a folder next to the selection and expand it.
    pub fn new_folder(&mut self, selected: Option<&str>, name: &str) -> Result<NodeId, ApiError> {
        let name = non_empty_name(name)?;
        let parent_id = self.tree.resolve_parent_folder_id(selected);
        let name = ensure_unique_child_name(&self.tree, &parent_id, name);

        let (tree, id) = self.tree.create_folder(&parent_id, &name, now_millis())?;
        self.commit_tree(tree);
        self.expanded.insert(parent_id);
        self.expanded.insert(id.clone());
        self.persist_expanded();
        info!(folder_id = %id, name = %name, "Folder created");
        Ok(id)
    }

    /// Rename a node. Renaming to the current name is a no-op.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<(), ApiError> {
        let new_name = non_empty_name(new_name)?;
        if self.tree.node(id)?.name == new_name {
            return Ok(());
        }
        let tree = self.tree.rename_node(id, new_name, now_millis())?;
        self.commit_tree(tree);
        debug!(node_id = id, name = new_name, "Node renamed");
        Ok(())
    }

    /// Delete a node and its subtree, then purge everything stored for it.
    ///
    /// The tree is persisted before any purge; a crash in between leaves orphans that
    /// the next bootstrap sweeps. If the open file was deleted, the first remaining
    /// file is opened instead.
    pub async fn delete(&mut self, id: &str) -> Result<DeleteOutcome, ApiError> {
        let file_ids = self.tree.collect_subtree_file_ids(id)?;
        let (tree, deleted_ids) = self.tree.delete_node(id, now_millis())?;

        let candidate_assets = self.asset_refs_of(&file_ids).await;
        self.commit_tree(tree);

        for removed in &deleted_ids {
            self.expanded.remove(removed);
        }
        self.persist_expanded();

        for file_id in &file_ids {
            self.saves.forget(file_id);
            if let Err(e) = self.stores.content.delete_content(file_id).await {
                error!(file_id = %file_id, error = %e, "Failed to purge content");
            }
            if let Err(e) = self.stores.handles.delete_handle(file_id).await {
                error!(file_id = %file_id, error = %e, "Failed to purge disk link");
            }
        }

        let purged_assets = self.purge_unreferenced_assets(candidate_assets).await;

        let mut reopened = None;
        let current_deleted = self
            .current_file_id
            .as_ref()
            .map(|current| deleted_ids.contains(current))
            .unwrap_or(false);
        if current_deleted {
            self.current_file_id = None;
            if let Some(next) = first_file_id(&self.tree) {
                self.open_file(&next).await?;
                reopened = Some(next);
            } else {
                self.update_settings(|s| s.last_open_file_id = None);
            }
        }

        info!(
            node_id = id,
            count = deleted_ids.len(),
            files = file_ids.len(),
            "Node deleted"
        );
        Ok(DeleteOutcome {
            deleted_ids,
            purged_files: file_ids,
            purged_assets,
            reopened,
        })
    }

    /// Move a node into another folder and expand the destination.
    pub fn move_node(&mut self, id: &str, dest_folder_id: &str) -> Result<(), ApiError> {
        let tree = self.tree.move_node(id, dest_folder_id, now_millis())?;
        self.commit_tree(tree);
        self.expanded.insert(dest_folder_id.to_string());
        self.persist_expanded();
        debug!(node_id = id, destination = dest_folder_id, "Node moved");
        Ok(())
    }

    /// Flip a folder's expansion. The root always stays expanded. Returns the new state.
    pub fn toggle_folder(&mut self, folder_id: &str) -> Result<bool, ApiError> {
        if !self.tree.node(folder_id)?.is_folder() {
            return Err(ApiError::InvalidArgument(format!(
                "not a folder: {}",
                folder_id
            )));
        }
        let expanded = if self.expanded.remove(folder_id) {
            false
        } else {
            self.expanded.insert(folder_id.to_string());
            true
        };
        self.expanded.insert(self.tree.root_id.clone());
        self.persist_expanded();
        Ok(expanded || folder_id == self.tree.root_id)
    }

    // --- Import ---

    /// Import loose files next to the selection and open the first one.
    pub async fn import_files(
        &mut self,
        selected: Option<&str>,
        files: Vec<ImportFile>,
    ) -> Result<ImportSummary, ApiError> {
        let parent_id = self.tree.resolve_parent_folder_id(selected);
        let mut summary = ImportSummary::default();

        for file in files {
            let raw = if file.name.trim().is_empty() {
                "untitled".to_string()
            } else {
                file.name.clone()
            };
            let name = ensure_unique_child_name(
                &self.tree,
                &parent_id,
                &ensure_extension(&raw, MARKDOWN_EXTENSION),
            );
            let (tree, id) = self.tree.create_file(&parent_id, &name, now_millis())?;
            self.commit_tree(tree);

            self.write_content(&id, &file.text).await;
            if let Some(handle) = file.handle {
                self.link_handle(&id, handle).await;
            }
            summary.file_ids.push(id);
        }

        self.expanded.insert(parent_id);
        self.persist_expanded();
        if let Some(first) = summary.file_ids.first().cloned() {
            self.open_file(&first).await?;
        }
        info!(count = summary.file_ids.len(), "Files imported");
        Ok(summary)
    }

    /// Import a folder of files under a new top folder next to the selection.
    ///
    /// Intermediate folders are created from the relative paths. Entries that are not
    /// Markdown or text files are skipped. The tree is persisted once at the end.
    pub async fn import_folder(
        &mut self,
        selected: Option<&str>,
        root_folder_name: &str,
        entries: Vec<ImportEntry>,
    ) -> Result<ImportSummary, ApiError> {
        let parent_id = self.tree.resolve_parent_folder_id(selected);
        let top_name = if root_folder_name.trim().is_empty() {
            DEFAULT_IMPORT_FOLDER_NAME
        } else {
            root_folder_name
        };
        let top_name = ensure_unique_child_name(&self.tree, &parent_id, top_name);

        let now = now_millis();
        let (mut tree, top_id) = self.tree.create_folder(&parent_id, &top_name, now)?;
        let mut folder_ids: HashMap<String, NodeId> = HashMap::new();
        let mut created_folders = vec![top_id.clone()];
        let mut summary = ImportSummary {
            folder_id: Some(top_id.clone()),
            ..ImportSummary::default()
        };
        let mut contents = Vec::new();

        for entry in entries {
            let parts: Vec<&str> = entry
                .relative_path
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            let Some((file_name, dirs)) = parts.split_last() else {
                continue;
            };
            if !crate::tree::naming::is_supported_import_file(file_name) {
                summary.skipped.push(entry.relative_path.clone());
                continue;
            }

            let mut folder_path = String::new();
            let mut folder_id = top_id.clone();
            for dir in dirs {
                if !folder_path.is_empty() {
                    folder_path.push('/');
                }
                folder_path.push_str(dir);
                folder_id = match folder_ids.get(&folder_path) {
                    Some(existing) => existing.clone(),
                    None => {
                        let (next, id) = tree.create_folder(&folder_id, dir, now)?;
                        tree = next;
                        folder_ids.insert(folder_path.clone(), id.clone());
                        created_folders.push(id.clone());
                        id
                    }
                };
            }

            let name = ensure_extension(file_name, MARKDOWN_EXTENSION);
            let (next, id) = tree.create_file(&folder_id, &name, now)?;
            tree = next;
            contents.push((id.clone(), entry.text, entry.handle));
            summary.file_ids.push(id);
        }

        self.commit_tree(tree);
        for (id, text, handle) in contents {
            self.write_content(&id, &text).await;
            if let Some(handle) = handle {
                self.link_handle(&id, handle).await;
            }
        }

        self.expanded.insert(self.tree.root_id.clone());
        self.expanded.insert(parent_id);
        self.expanded.extend(created_folders);
        self.persist_expanded();

        if let Some(first) = summary.file_ids.first().cloned() {
            self.open_file(&first).await?;
        }
        info!(
            folder_id = %top_id,
            files = summary.file_ids.len(),
            skipped = summary.skipped.len(),
            "Folder imported"
        );
        Ok(summary)
    }

    // --- Disk links ---

    /// Write the file's text to `handle` now and remember the link for later write-back.
    pub async fn link_external_file(
        &mut self,
        file_id: &str,
        handle: Arc<dyn ExternalFileHandle>,
    ) -> Result<WriteBackOutcome, ApiError> {
        self.require_file(file_id)?;
        if !handle.supports_write() {
            return Ok(WriteBackOutcome::Unsupported);
        }
        if !handle.check_permission().await && !handle.request_permission().await {
            return Ok(WriteBackOutcome::PermissionDenied);
        }

        self.saves.flush().await;
        let text = self.load_text(file_id).await?;
        handle.write(&text).await?;
        self.stores.handles.put_handle(file_id, handle.clone()).await?;
        info!(file_id, target = %handle.describe(), "Linked to disk file");
        Ok(WriteBackOutcome::Written)
    }

    // --- Assets ---

    /// Store pasted binary data and return its id and the snippet to insert.
    pub async fn paste_asset(
        &self,
        mime: Option<&str>,
        data: Vec<u8>,
    ) -> Result<(AssetId, String), ApiError> {
        let id = new_id();
        let mime = mime
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_ASSET_MIME)
            .to_string();
        let bytes = data.len();
        self.stores
            .content
            .put_asset(Asset {
                id: id.clone(),
                mime,
                data,
                created_at: now_millis(),
            })
            .await?;
        debug!(asset_id = %id, bytes, "Asset stored");
        let snippet = assets::image_snippet(&id);
        Ok((id, snippet))
    }

    /// Look up the asset an embedded URI points at.
    pub async fn resolve_asset(&self, uri: &str) -> Result<Option<Asset>, ApiError> {
        match assets::parse_asset_id(uri) {
            Some(id) => Ok(self.stores.content.get_asset(id).await?),
            None => Ok(None),
        }
    }

    /// Remove content and link records for ids that are no longer files, and assets no
    /// remaining file refers to.
    ///
    /// Does nothing while an unreadable tree record is backed up, since its notes are
    /// not in the current tree.
    pub async fn sweep_orphans(&self) -> Result<SweepReport, ApiError> {
        if store::has_tree_backup(self.stores.kv.as_ref())? {
            warn!(
                key = keys::TREE_BACKUP,
                "Orphan sweep skipped while an unreadable tree backup exists"
            );
            return Ok(SweepReport::default());
        }
        self.saves.flush().await;
        let mut report = SweepReport::default();

        for id in self.stores.content.list_content_ids().await? {
            if !self.tree.is_file(&id) {
                self.stores.content.delete_content(&id).await?;
                report.contents.push(id);
            }
        }
        for id in self.stores.handles.list_handle_ids().await? {
            if !self.tree.is_file(&id) {
                self.stores.handles.delete_handle(&id).await?;
                report.handles.push(id);
            }
        }

        let referenced = self.asset_refs_of(&self.tree.file_ids()).await;
        for id in self.stores.content.list_asset_ids().await? {
            if !referenced.contains(&id) {
                self.stores.content.delete_asset(&id).await?;
                report.assets.push(id);
            }
        }
        Ok(report)
    }

    // --- Settings ---

    pub fn set_theme(&mut self, mode: ThemeMode) {
        self.update_settings(move |s| s.theme_mode = mode);
    }

    pub fn set_language(&mut self, language: Language) {
        self.update_settings(move |s| s.language = language);
    }

    pub fn set_export_include_header(&mut self, include: bool) {
        self.update_settings(move |s| s.export.include_header = include);
    }

    pub fn set_ignore_frontmatter(&mut self, ignore: bool) {
        self.update_settings(move |s| s.preview.ignore_frontmatter = ignore);
    }

    /// Override a shortcut. `None` restores the default; an empty binding disables it.
    pub fn set_shortcut(&mut self, action_id: &str, binding: Option<&str>) -> Result<(), ApiError> {
        if shortcuts::find_def(action_id).is_none() {
            return Err(ApiError::InvalidArgument(format!(
                "unknown shortcut action: {}",
                action_id
            )));
        }
        let action_id = action_id.to_string();
        let binding = binding.map(|b| b.trim().to_string());
        self.update_settings(move |s| match &binding {
            Some(binding) => {
                s.shortcuts.insert(action_id.clone(), binding.clone());
            }
            None => {
                s.shortcuts.remove(&action_id);
            }
        });
        Ok(())
    }

    /// Resize panes; the write is debounced.
    pub fn set_pane_widths(&mut self, widths: PaneWidths) {
        self.settings.ui.set_widths(widths);
        self.layout.set_widths(widths);
    }

    // --- Internals ---

    fn require_file(&self, id: &str) -> Result<&Node, ApiError> {
        let node = self.tree.node(id)?;
        if !node.is_file() {
            return Err(TreeError::NotAFile(id.to_string()).into());
        }
        Ok(node)
    }

    fn commit_tree(&mut self, tree: TreeState) {
        self.tree = tree;
        if let Err(e) = store::save_tree(self.stores.kv.as_ref(), &self.tree) {
            error!(error = %e, "Failed to persist tree");
        }
    }

    fn persist_expanded(&mut self) {
        let ids = self.expanded_folder_ids();
        self.settings.ui.expanded_folder_ids = Some(ids.clone());
        self.layout.set_expanded(ids);
    }

    fn update_settings<F>(&mut self, apply: F)
    where
        F: Fn(&mut Settings),
    {
        apply(&mut self.settings);
        if let Err(e) = self.settings_store.update(|s| apply(s)) {
            error!(error = %e, "Failed to persist settings");
        }
    }

    async fn write_content(&self, file_id: &str, text: &str) {
        let record = FileContent {
            file_id: file_id.to_string(),
            content: text.to_string(),
            updated_at: now_millis(),
        };
        if let Err(e) = self.stores.content.put_content(record).await {
            error!(file_id, error = %e, "Failed to write content");
        }
    }

    async fn link_handle(&self, file_id: &str, handle: Arc<dyn ExternalFileHandle>) {
        if let Err(e) = self.stores.handles.put_handle(file_id, handle).await {
            warn!(file_id, error = %e, "Failed to remember disk link");
        }
    }

    /// Asset ids referenced from the stored text of `file_ids`.
    async fn asset_refs_of(&self, file_ids: &[NodeId]) -> HashSet<AssetId> {
        let mut refs = HashSet::new();
        for file_id in file_ids {
            match store::load_text(self.stores.content.as_ref(), file_id).await {
                Ok(text) => refs.extend(assets::find_asset_refs(&text)),
                Err(e) => warn!(file_id = %file_id, error = %e, "Failed to scan content for assets"),
            }
        }
        refs
    }

    /// Delete the candidates no remaining file refers to, in stored text or in edits
    /// the save coordinator has not committed yet.
    async fn purge_unreferenced_assets(&self, candidates: HashSet<AssetId>) -> Vec<AssetId> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let mut still_used = self.asset_refs_of(&self.tree.file_ids()).await;
        for (file_id, text) in self.saves.uncommitted_texts() {
            if self.tree.is_file(&file_id) {
                still_used.extend(assets::find_asset_refs(&text));
            }
        }
        let mut purged: Vec<AssetId> = candidates
            .into_iter()
            .filter(|id| !still_used.contains(id))
            .collect();
        purged.sort();

        let mut done = Vec::with_capacity(purged.len());
        for id in purged {
            match self.stores.content.delete_asset(&id).await {
                Ok(()) => done.push(id),
                Err(e) => error!(asset_id = %id, error = %e, "Failed to purge asset"),
            }
        }
        done
    }
}

fn non_empty_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidArgument("name must not be empty".to_string()));
    }
    if trimmed.contains('/') {
        return Err(ApiError::InvalidArgument(format!(
            "name must not contain '/': {}",
            trimmed
        )));
    }
    Ok(trimmed)
}
