use crate::integration::support::{manual_workspace, reopen};
use markdesk::settings::{Language, SettingsStore};
use markdesk::store::{self, keys, ContentStore, KeyValueStore};
use markdesk::tree::{TreeState, SEED_FILE_NAME};
use markdesk::workspace::{bootstrap, seed_text, BootstrapOrigin, WorkspaceStores};
use std::sync::Arc;

#[tokio::test]
async fn first_run_opens_seed_file_with_intro_text() {
    let (store, _clock, ws) = manual_workspace().await;

    assert_eq!(ws.origin(), BootstrapOrigin::FirstRun);
    let current = ws.current_file_id().unwrap().to_string();
    assert_eq!(ws.tree().node(&current).unwrap().name, SEED_FILE_NAME);
    assert_eq!(ws.tree().len(), 2);

    let text = store.get_content(&current).await.unwrap().unwrap().content;
    assert_eq!(text, seed_text(Language::ZhCn));
}

#[tokio::test]
async fn restart_restores_tree_and_open_file() {
    let (store, clock, mut ws) = manual_workspace().await;
    let id = ws.new_file(None, "journal").await.unwrap();
    ws.flush().await;
    let tree = ws.tree().clone();
    drop(ws);

    let ws = reopen(&store, &clock).await;
    assert_eq!(ws.origin(), BootstrapOrigin::Resumed);
    assert_eq!(ws.tree(), &tree);
    assert_eq!(ws.current_file_id(), Some(id.as_str()));
}

#[tokio::test]
async fn stale_last_open_falls_back_to_first_file() {
    let (store, clock, ws) = manual_workspace().await;
    let seed = ws.current_file_id().unwrap().to_string();
    drop(ws);

    let settings = SettingsStore::new(store.clone());
    settings
        .update(|s| s.last_open_file_id = Some("vanished".to_string()))
        .unwrap();

    let ws = reopen(&store, &clock).await;
    assert_eq!(ws.current_file_id(), Some(seed.as_str()));
    assert_eq!(settings.load().last_open_file_id, Some(seed));
}

#[tokio::test]
async fn settings_language_picks_seed_text() {
    let store = Arc::new(markdesk::store::memory::MemoryStore::new());
    let stores = WorkspaceStores::single(store.clone());
    let settings = SettingsStore::new(stores.kv.clone());
    settings.update(|s| s.language = Language::En).unwrap();

    let boot = bootstrap(&stores, &settings).await.unwrap();
    let text = store::load_text(stores.content.as_ref(), &boot.current_file_id)
        .await
        .unwrap();
    assert_eq!(text, seed_text(Language::En));
}

#[tokio::test]
async fn unreadable_settings_fall_back_to_defaults() {
    let store = Arc::new(markdesk::store::memory::MemoryStore::new());
    store.set(keys::SETTINGS, "not json").unwrap();
    let stores = WorkspaceStores::single(store.clone());
    let settings = SettingsStore::new(stores.kv.clone());

    let boot = bootstrap(&stores, &settings).await.unwrap();
    assert_eq!(boot.origin, BootstrapOrigin::FirstRun);
    assert_eq!(boot.settings.language, Language::ZhCn);
}

#[tokio::test]
async fn resume_sweeps_content_left_by_interrupted_delete() {
    let (store, clock, ws) = manual_workspace().await;
    let tree: TreeState = ws.tree().clone();
    drop(ws);

    store
        .put_content(markdesk::store::FileContent {
            file_id: "orphan".to_string(),
            content: "left behind".to_string(),
            updated_at: 1,
        })
        .await
        .unwrap();

    let ws = reopen(&store, &clock).await;
    assert_eq!(ws.tree(), &tree);
    assert!(store.get_content("orphan").await.unwrap().is_none());
}

#[tokio::test]
async fn unreadable_tree_is_backed_up_and_old_notes_survive_restarts() {
    let (store, clock, mut ws) = manual_workspace().await;
    let notes = ws.new_file(None, "notes").await.unwrap();
    ws.edit(&notes, "precious notes").unwrap();
    ws.flush().await;
    drop(ws);

    let raw = store.get(keys::TREE).unwrap().unwrap();
    let truncated = &raw[..raw.len() / 2];
    store.set(keys::TREE, truncated).unwrap();

    let ws = reopen(&store, &clock).await;
    assert_eq!(ws.origin(), BootstrapOrigin::FirstRun);
    assert!(!ws.tree().is_file(&notes));
    assert_eq!(store.get(keys::TREE_BACKUP).unwrap().as_deref(), Some(truncated));
    drop(ws);

    let ws = reopen(&store, &clock).await;
    assert_eq!(ws.origin(), BootstrapOrigin::Resumed);
    let kept = store.get_content(&notes).await.unwrap().unwrap();
    assert_eq!(kept.content, "precious notes");

    assert!(ws.sweep_orphans().await.unwrap().is_empty());
    assert!(store.get_content(&notes).await.unwrap().is_some());
    let status = ws.status("mem").await.unwrap();
    assert!(status
        .integrity_issues
        .iter()
        .any(|issue| issue.contains(keys::TREE_BACKUP)));
}
