use markdesk::config::SaveConfig;
use markdesk::save::ManualClock;
use markdesk::store::persistence::SledStore;
use markdesk::store::{ContentStore, HandleStore};
use markdesk::tree::traversal::find_by_path;
use markdesk::workspace::{BootstrapOrigin, Workspace, WorkspaceOptions, WorkspaceStores};
use markdesk::writeback::{ExternalFileHandle, FsFileHandle};
use std::path::Path;
use std::sync::Arc;

async fn open(path: &Path) -> (Arc<SledStore>, Workspace) {
    let store = Arc::new(SledStore::open(path).unwrap());
    let options = WorkspaceOptions {
        save: SaveConfig::default(),
        clock: Arc::new(ManualClock::new()),
    };
    let ws = Workspace::open_with(WorkspaceStores::single(store.clone()), options)
        .await
        .unwrap();
    (store, ws)
}

#[tokio::test]
async fn workspace_round_trips_through_sled() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db");

    let (tree, file, asset_id) = {
        let (store, mut ws) = open(&db).await;
        let folder = ws.new_folder(None, "journal").unwrap();
        let file = ws.new_file(Some(&folder), "monday").await.unwrap();
        let (asset_id, snippet) = ws.paste_asset(Some("image/gif"), vec![7, 7]).await.unwrap();
        ws.edit(&file, format!("# Monday\n{}", snippet)).unwrap();
        ws.set_language(markdesk::settings::Language::En);
        ws.flush().await;
        store.flush().unwrap();
        (ws.tree().clone(), file, asset_id)
    };

    let (store, ws) = open(&db).await;
    assert_eq!(ws.origin(), BootstrapOrigin::Resumed);
    assert_eq!(ws.tree(), &tree);
    assert_eq!(ws.current_file_id(), Some(file.as_str()));
    assert_eq!(
        find_by_path(ws.tree(), "journal/monday.md").map(|n| n.id.clone()),
        Some(file.clone())
    );
    assert!(ws.load_text(&file).await.unwrap().starts_with("# Monday\n"));
    assert_eq!(ws.settings().language, markdesk::settings::Language::En);

    let asset = store.get_asset(&asset_id).await.unwrap().unwrap();
    assert_eq!(asset.mime, "image/gif");
    assert_eq!(asset.data, vec![7, 7]);
}

#[tokio::test]
async fn disk_links_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db");
    let target = dir.path().join("linked.md");

    let file = {
        let (store, mut ws) = open(&db).await;
        let file = ws.current_file_id().unwrap().to_string();
        ws.link_external_file(&file, Arc::new(FsFileHandle::new(&target)))
            .await
            .unwrap();
        store.flush().unwrap();
        file
    };

    let (store, _ws) = open(&db).await;
    let handle = store.get_handle(&file).await.unwrap().unwrap();
    assert_eq!(handle.describe(), FsFileHandle::new(&target).describe());
    assert!(store.list_handle_ids().await.unwrap().contains(&file));
}
