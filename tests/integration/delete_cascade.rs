use crate::integration::support::manual_workspace;
use markdesk::store::{ContentStore, HandleStore};
use markdesk::writeback::FsFileHandle;
use std::sync::Arc;

#[tokio::test]
async fn deleting_folder_purges_every_file_below_it() {
    let (store, _clock, mut ws) = manual_workspace().await;
    let seed = ws.current_file_id().unwrap().to_string();

    let projects = ws.new_folder(None, "projects").unwrap();
    let alpha = ws.new_folder(Some(&projects), "alpha").unwrap();
    let notes = ws.new_file(Some(&alpha), "notes").await.unwrap();
    let todo = ws.new_file(Some(&projects), "todo").await.unwrap();
    ws.edit(&notes, "alpha notes").unwrap();
    ws.edit(&todo, "- [ ] ship").unwrap();
    ws.flush().await;

    let outcome = ws.delete(&projects).await.unwrap();

    assert_eq!(outcome.deleted_ids.len(), 4);
    assert_eq!(outcome.deleted_ids[0], projects);
    let mut purged = outcome.purged_files.clone();
    purged.sort();
    let mut expected = vec![notes.clone(), todo.clone()];
    expected.sort();
    assert_eq!(purged, expected);

    let mut remaining = store.list_content_ids().await.unwrap();
    remaining.sort();
    assert_eq!(remaining, vec![seed.clone()]);
    assert_eq!(outcome.reopened.as_deref(), Some(seed.as_str()));
    assert_eq!(ws.current_file_id(), Some(seed.as_str()));
}

#[tokio::test]
async fn deleting_other_file_keeps_current_file_open() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let seed = ws.current_file_id().unwrap().to_string();
    let other = ws.new_file(None, "other").await.unwrap();
    ws.open_file(&seed).await.unwrap();

    let outcome = ws.delete(&other).await.unwrap();
    assert!(outcome.reopened.is_none());
    assert_eq!(ws.current_file_id(), Some(seed.as_str()));
}

#[tokio::test]
async fn deleting_last_file_clears_open_file() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let seed = ws.current_file_id().unwrap().to_string();

    let outcome = ws.delete(&seed).await.unwrap();
    assert!(outcome.reopened.is_none());
    assert!(ws.current_file_id().is_none());
    ws.flush().await;
    assert!(ws.settings().last_open_file_id.is_none());
}

#[tokio::test]
async fn pending_edit_of_deleted_file_is_never_written() {
    let (store, clock, mut ws) = manual_workspace().await;
    let doomed = ws.new_file(None, "doomed").await.unwrap();
    ws.edit(&doomed, "unsaved").unwrap();

    ws.delete(&doomed).await.unwrap();
    clock.advance_ms(5_000);
    ws.tick().await;

    assert!(store.get_content(&doomed).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_linked_file_drops_its_disk_link() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _clock, mut ws) = manual_workspace().await;
    let file = ws.new_file(None, "linked").await.unwrap();
    ws.link_external_file(&file, Arc::new(FsFileHandle::new(dir.path().join("linked.md"))))
        .await
        .unwrap();
    assert!(store.get_handle(&file).await.unwrap().is_some());

    ws.delete(&file).await.unwrap();
    assert!(store.get_handle(&file).await.unwrap().is_none());
    assert!(dir.path().join("linked.md").exists());
}
