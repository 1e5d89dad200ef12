use crate::integration::support::{manual_workspace, reopen};
use markdesk::error::{ApiError, TreeError};
use markdesk::settings::{Language, ThemeMode};
use markdesk::shortcuts;
use markdesk::store::ContentStore;
use markdesk::workspace::ImportFile;
use markdesk::writeback::{FsFileHandle, WriteBackOutcome};
use std::sync::Arc;

#[tokio::test]
async fn new_files_get_extension_and_unique_names() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let a = ws.new_file(None, "draft").await.unwrap();
    let b = ws.new_file(None, "draft").await.unwrap();
    let c = ws.new_file(None, "data.txt").await.unwrap();

    assert_eq!(ws.tree().node(&a).unwrap().name, "draft.md");
    assert_eq!(ws.tree().node(&b).unwrap().name, "draft (1).md");
    assert_eq!(ws.tree().node(&c).unwrap().name, "data.txt");
    assert_eq!(ws.current_file_id(), Some(c.as_str()));
    assert_eq!(ws.load_text(&c).await.unwrap(), "");
}

#[tokio::test]
async fn bad_names_are_rejected() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    assert!(matches!(
        ws.new_file(None, "   ").await,
        Err(ApiError::InvalidArgument(_))
    ));
    assert!(matches!(
        ws.new_folder(None, "a/b"),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn opening_a_nested_file_expands_its_ancestors() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let outer = ws.new_folder(None, "outer").unwrap();
    let inner = ws.new_folder(Some(&outer), "inner").unwrap();
    let file = ws.new_file(Some(&inner), "deep").await.unwrap();
    let seed = ws.tree().file_ids().into_iter().find(|id| id != &file).unwrap();
    ws.open_file(&seed).await.unwrap();

    assert!(!ws.toggle_folder(&outer).unwrap());
    assert!(!ws.toggle_folder(&inner).unwrap());
    assert!(!ws.is_expanded(&outer));

    ws.open_file(&file).await.unwrap();
    assert!(ws.is_expanded(&outer));
    assert!(ws.is_expanded(&inner));
}

#[tokio::test]
async fn folders_cannot_be_opened_as_files() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let folder = ws.new_folder(None, "docs").unwrap();
    assert!(matches!(
        ws.open_file(&folder).await,
        Err(ApiError::Tree(TreeError::NotAFile(_)))
    ));
}

#[tokio::test]
async fn expanded_folders_survive_restart() {
    let (store, clock, mut ws) = manual_workspace().await;
    let folder = ws.new_folder(None, "kept-open").unwrap();
    ws.flush().await;
    drop(ws);

    let ws = reopen(&store, &clock).await;
    assert!(ws.is_expanded(&folder));
}

#[tokio::test]
async fn pasted_asset_is_purged_with_its_only_referencing_file() {
    let (store, _clock, mut ws) = manual_workspace().await;
    let file = ws.new_file(None, "with-image").await.unwrap();

    let (asset_id, snippet) = ws.paste_asset(None, vec![1, 2, 3]).await.unwrap();
    assert!(snippet.contains(&asset_id));
    ws.edit(&file, format!("Look:\n\n{}\n", snippet)).unwrap();
    ws.flush().await;

    let uri = markdesk::assets::asset_uri(&asset_id);
    let asset = ws.resolve_asset(&uri).await.unwrap().unwrap();
    assert_eq!(asset.mime, "image/png");
    assert_eq!(asset.data, vec![1, 2, 3]);

    let outcome = ws.delete(&file).await.unwrap();
    assert_eq!(outcome.purged_assets, vec![asset_id.clone()]);
    assert!(store.get_asset(&asset_id).await.unwrap().is_none());
}

#[tokio::test]
async fn shared_asset_survives_deleting_one_referrer() {
    let (store, _clock, mut ws) = manual_workspace().await;
    let (asset_id, snippet) = ws.paste_asset(Some("image/jpeg"), vec![9]).await.unwrap();
    let a = ws.new_file(None, "a").await.unwrap();
    let b = ws.new_file(None, "b").await.unwrap();
    ws.edit(&a, snippet.clone()).unwrap();
    ws.edit(&b, snippet).unwrap();
    ws.flush().await;

    let outcome = ws.delete(&a).await.unwrap();
    assert!(outcome.purged_assets.is_empty());
    assert!(store.get_asset(&asset_id).await.unwrap().is_some());
}

#[tokio::test]
async fn asset_referenced_only_by_unsaved_edit_survives_delete() {
    let (store, clock, mut ws) = manual_workspace().await;
    let (asset_id, snippet) = ws.paste_asset(None, vec![4, 2]).await.unwrap();
    let a = ws.new_file(None, "a").await.unwrap();
    let b = ws.new_file(None, "b").await.unwrap();
    ws.edit(&a, snippet.clone()).unwrap();
    ws.flush().await;

    ws.edit(&b, format!("copied: {}", snippet)).unwrap();
    clock.advance_ms(100);
    let outcome = ws.delete(&a).await.unwrap();
    assert!(outcome.purged_assets.is_empty());
    assert!(store.get_asset(&asset_id).await.unwrap().is_some());

    clock.advance_ms(450);
    ws.tick().await;
    let saved = store.get_content(&b).await.unwrap().unwrap().content;
    assert!(saved.contains(&asset_id));
    assert!(ws.resolve_asset(&markdesk::assets::asset_uri(&asset_id)).await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_removes_unreferenced_assets() {
    let (store, _clock, ws) = manual_workspace().await;
    let (asset_id, _) = ws.paste_asset(None, vec![0]).await.unwrap();

    let report = ws.sweep_orphans().await.unwrap();
    assert_eq!(report.assets, vec![asset_id.clone()]);
    assert!(store.get_asset(&asset_id).await.unwrap().is_none());
}

#[tokio::test]
async fn settings_mutators_persist_immediately() {
    let (store, clock, mut ws) = manual_workspace().await;
    ws.set_theme(ThemeMode::Dark);
    ws.set_language(Language::En);
    ws.set_export_include_header(false);
    ws.set_ignore_frontmatter(false);
    ws.set_shortcut("fmt.bold", Some("Mod+Shift+B")).unwrap();
    ws.set_shortcut("fmt.italic", Some("")).unwrap();
    drop(ws);

    let ws = reopen(&store, &clock).await;
    let settings = ws.settings();
    assert_eq!(settings.theme_mode, ThemeMode::Dark);
    assert_eq!(settings.language, Language::En);
    assert!(!settings.export.include_header);
    assert!(!settings.preview.ignore_frontmatter);
    assert_eq!(
        shortcuts::effective_binding(settings, "fmt.bold").as_deref(),
        Some("Mod+Shift+B")
    );
    assert_eq!(shortcuts::effective_binding(settings, "fmt.italic"), None);
}

#[tokio::test]
async fn rename_to_same_name_changes_nothing() {
    let (_store, _clock, mut ws) = manual_workspace().await;
    let id = ws.new_file(None, "same").await.unwrap();
    let before = ws.tree().clone();
    ws.rename(&id, "same.md").unwrap();
    assert_eq!(ws.tree(), &before);

    ws.rename(&id, "other.md").unwrap();
    assert_eq!(ws.tree().node(&id).unwrap().name, "other.md");
}

#[tokio::test]
async fn imported_files_open_the_first_one() {
    let (store, _clock, mut ws) = manual_workspace().await;
    let summary = ws
        .import_files(
            None,
            vec![
                ImportFile {
                    name: "one.md".to_string(),
                    text: "1".to_string(),
                    handle: None,
                },
                ImportFile {
                    name: "two".to_string(),
                    text: "2".to_string(),
                    handle: None,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(summary.file_ids.len(), 2);
    assert_eq!(ws.current_file_id(), Some(summary.file_ids[0].as_str()));
    assert_eq!(ws.tree().node(&summary.file_ids[1]).unwrap().name, "two.md");
    let stored = store.get_content(&summary.file_ids[1]).await.unwrap().unwrap();
    assert_eq!(stored.content, "2");
}

#[tokio::test]
async fn linked_file_receives_edits_after_write_back_window() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.md");
    let (_store, clock, mut ws) = manual_workspace().await;
    let file = ws.current_file_id().unwrap().to_string();
    ws.edit(&file, "first").unwrap();

    let outcome = ws
        .link_external_file(&file, Arc::new(FsFileHandle::new(&target)))
        .await
        .unwrap();
    assert_eq!(outcome, WriteBackOutcome::Written);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "first");

    ws.edit(&file, "second").unwrap();
    clock.advance_ms(450);
    let report = ws.tick().await;
    assert!(report.written_back.is_empty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "first");

    clock.advance_ms(900);
    let report = ws.tick().await;
    assert_eq!(report.written_back, vec![(file.clone(), WriteBackOutcome::Written)]);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
}
