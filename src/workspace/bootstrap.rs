//! Workspace bootstrap: resume a stored workspace or seed a new one.
//!
//! Whatever path is taken, the returned `current_file_id` names an existing file.
//! Write failures along the way are logged and the in-memory result is still returned.

use super::types::{BootstrapOrigin, WorkspaceBootstrap, WorkspaceStores};
use crate::error::ApiError;
use crate::settings::{Language, Settings, SettingsStore};
use crate::store::{self, keys, FileContent, TreeRecord};
use crate::tree::traversal::first_file_id;
use crate::tree::TreeState;
use crate::types::{now_millis, NodeId};
use tracing::{error, info, warn};

/// Name of the file created when a stored tree has no files left
pub const FALLBACK_FILE_NAME: &str = "untitled.md";

const SEED_TEXT_EN: &str = "# Markdesk\n\n\
A local Markdown workspace:\n\n\
- Notes are stored on this machine only\n\
- Nothing is uploaded anywhere\n\n\
## Getting around\n\n\
- File tree: new, rename, delete, move\n\
- Edit in the middle, preview on the right\n";

const SEED_TEXT_ZH: &str = "# 墨档\n\n\
本地 Markdown 工作区：\n\n\
- 数据只保存在本机\n\
- 不做任何外部上传\n\n\
## 快捷操作\n\n\
- 左侧文件树：新建/重命名/删除/移动\n\
- 中间编辑，右侧预览\n";

/// Introductory text for the seed file
pub fn seed_text(language: Language) -> &'static str {
    match language {
        Language::En => SEED_TEXT_EN,
        Language::ZhCn => SEED_TEXT_ZH,
    }
}

/// Run bootstrap against the given stores.
///
/// A read failure on the tree record is returned as an error rather than treated as a
/// first run, so an unreachable store never gets overwritten by a fresh seed. An
/// unreadable record is copied to [`keys::TREE_BACKUP`] before a new tree is seeded;
/// if that copy cannot be written, bootstrap fails.
pub async fn bootstrap(
    stores: &WorkspaceStores,
    settings_store: &SettingsStore,
) -> Result<WorkspaceBootstrap, ApiError> {
    let settings = settings_store.load();
    match store::read_tree(stores.kv.as_ref())? {
        TreeRecord::Valid(tree) => resume(stores, settings_store, settings, tree).await,
        TreeRecord::Missing => first_run(stores, settings_store, settings).await,
        TreeRecord::Unreadable(raw) => {
            if store::back_up_tree(stores.kv.as_ref(), &raw)? {
                warn!(
                    key = keys::TREE_BACKUP,
                    bytes = raw.len(),
                    "Unreadable tree record backed up, starting a new tree"
                );
            }
            first_run(stores, settings_store, settings).await
        }
    }
}

async fn resume(
    stores: &WorkspaceStores,
    settings_store: &SettingsStore,
    mut settings: Settings,
    tree: TreeState,
) -> Result<WorkspaceBootstrap, ApiError> {
    let remembered = settings
        .last_open_file_id
        .clone()
        .filter(|id| tree.is_file(id));

    let (tree, current_file_id, origin) = match remembered.or_else(|| first_file_id(&tree)) {
        Some(id) => (tree, id, BootstrapOrigin::Resumed),
        None => {
            let (tree, id) = create_fallback_file(stores, &tree).await?;
            (tree, id, BootstrapOrigin::CreatedFallbackFile)
        }
    };

    if settings.last_open_file_id.as_deref() != Some(current_file_id.as_str()) {
        settings.last_open_file_id = Some(current_file_id.clone());
        let id = current_file_id.clone();
        if let Err(e) = settings_store.update(move |s| s.last_open_file_id = Some(id)) {
            error!(error = %e, "Failed to persist last opened file");
        }
    }

    info!(
        nodes = tree.len(),
        current_file_id = %current_file_id,
        ?origin,
        "Workspace resumed"
    );
    Ok(WorkspaceBootstrap {
        settings,
        tree,
        current_file_id,
        origin,
    })
}

async fn create_fallback_file(
    stores: &WorkspaceStores,
    tree: &TreeState,
) -> Result<(TreeState, NodeId), ApiError> {
    warn!("Stored workspace has no files, creating {}", FALLBACK_FILE_NAME);
    let root_id = tree.root_id.clone();
    let (tree, id) = tree.create_file(&root_id, FALLBACK_FILE_NAME, now_millis())?;
    persist_tree(stores, &tree);
    write_initial_content(stores, &id, "").await;
    Ok((tree, id))
}

async fn first_run(
    stores: &WorkspaceStores,
    settings_store: &SettingsStore,
    mut settings: Settings,
) -> Result<WorkspaceBootstrap, ApiError> {
    let (tree, seed_id) = TreeState::seeded(now_millis());
    persist_tree(stores, &tree);
    write_initial_content(stores, &seed_id, seed_text(settings.language)).await;

    settings.last_open_file_id = Some(seed_id.clone());
    if let Err(e) = settings_store.save(&settings) {
        error!(error = %e, "Failed to persist settings");
    }

    info!(seed_file_id = %seed_id, "Workspace created");
    Ok(WorkspaceBootstrap {
        settings,
        tree,
        current_file_id: seed_id,
        origin: BootstrapOrigin::FirstRun,
    })
}

fn persist_tree(stores: &WorkspaceStores, tree: &TreeState) {
    if let Err(e) = store::save_tree(stores.kv.as_ref(), tree) {
        error!(error = %e, "Failed to persist tree");
    }
}

async fn write_initial_content(stores: &WorkspaceStores, file_id: &str, text: &str) {
    let record = FileContent {
        file_id: file_id.to_string(),
        content: text.to_string(),
        updated_at: now_millis(),
    };
    if let Err(e) = stores.content.put_content(record).await {
        error!(file_id, error = %e, "Failed to write initial content");
    }
}
