use crate::integration::support::{manual_workspace, reopen};
use markdesk::save::DocState;
use markdesk::settings::PaneWidths;
use markdesk::store::ContentStore;

#[tokio::test]
async fn burst_of_edits_produces_one_write_with_last_text() {
    let (store, clock, ws) = manual_workspace().await;
    let file = ws.current_file_id().unwrap().to_string();
    let writes_before = store.content_write_count();

    ws.edit(&file, "a").unwrap();
    clock.advance_ms(100);
    ws.edit(&file, "ab").unwrap();
    clock.advance_ms(100);
    ws.edit(&file, "abc").unwrap();

    clock.advance_ms(449);
    assert!(ws.tick().await.is_empty());
    assert_eq!(store.content_write_count(), writes_before);
    assert_eq!(ws.save_coordinator().state(&file), DocState::Dirty);

    clock.advance_ms(1);
    let report = ws.tick().await;
    assert_eq!(report.saved, vec![file.clone()]);
    assert_eq!(store.content_write_count(), writes_before + 1);
    assert_eq!(store.get_content(&file).await.unwrap().unwrap().content, "abc");
    assert_eq!(ws.save_coordinator().state(&file), DocState::Clean);
}

#[tokio::test]
async fn edits_to_two_files_are_saved_independently() {
    let (store, clock, mut ws) = manual_workspace().await;
    let first = ws.current_file_id().unwrap().to_string();
    let second = ws.new_file(None, "second").await.unwrap();

    ws.edit(&first, "one").unwrap();
    clock.advance_ms(300);
    ws.edit(&second, "two").unwrap();

    clock.advance_ms(150);
    let report = ws.tick().await;
    assert_eq!(report.saved, vec![first.clone()]);

    clock.advance_ms(300);
    let report = ws.tick().await;
    assert_eq!(report.saved, vec![second.clone()]);

    assert_eq!(store.get_content(&first).await.unwrap().unwrap().content, "one");
    assert_eq!(store.get_content(&second).await.unwrap().unwrap().content, "two");
}

#[tokio::test]
async fn flush_commits_pending_edit_before_its_window() {
    let (store, _clock, ws) = manual_workspace().await;
    let file = ws.current_file_id().unwrap().to_string();
    ws.edit(&file, "typed just before quit").unwrap();

    let report = ws.flush().await;
    assert_eq!(report.saved, vec![file.clone()]);
    assert_eq!(
        store.get_content(&file).await.unwrap().unwrap().content,
        "typed just before quit"
    );
}

#[tokio::test]
async fn failed_save_is_retried_by_next_edit() {
    let (store, clock, ws) = manual_workspace().await;
    let file = ws.current_file_id().unwrap().to_string();

    store.set_fail_writes(true);
    ws.edit(&file, "lost?").unwrap();
    clock.advance_ms(450);
    let report = ws.tick().await;
    assert_eq!(report.failed, vec![file.clone()]);
    assert_eq!(ws.save_coordinator().state(&file), DocState::Dirty);

    store.set_fail_writes(false);
    ws.edit(&file, "kept").unwrap();
    clock.advance_ms(450);
    ws.tick().await;
    assert_eq!(store.get_content(&file).await.unwrap().unwrap().content, "kept");
}

#[tokio::test]
async fn pane_widths_are_clamped_and_persisted_after_quiet_period() {
    let (store, clock, mut ws) = manual_workspace().await;

    ws.set_pane_widths(PaneWidths {
        left: 50.0,
        center: 600.0,
        right: 2_000.0,
    });
    ws.set_pane_widths(PaneWidths {
        left: 300.0,
        center: 600.0,
        right: 2_000.0,
    });
    clock.advance_ms(200);
    ws.tick().await;

    let ws = reopen(&store, &clock).await;
    let ui = &ws.settings().ui;
    assert_eq!(ui.left_width, 300.0);
    assert_eq!(ui.center_width, 600.0);
    assert_eq!(ui.right_width, 980.0);
}
