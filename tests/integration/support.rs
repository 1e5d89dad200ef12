use markdesk::config::SaveConfig;
use markdesk::save::ManualClock;
use markdesk::store::memory::MemoryStore;
use markdesk::workspace::{Workspace, WorkspaceOptions, WorkspaceStores};
use std::sync::Arc;

/// Workspace over a fresh in-memory store, driven by a manual clock.
pub async fn manual_workspace() -> (Arc<MemoryStore>, Arc<ManualClock>, Workspace) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new());
    let workspace = reopen(&store, &clock).await;
    (store, clock, workspace)
}

/// Open a workspace over an existing store, as a restart would.
pub async fn reopen(store: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> Workspace {
    let options = WorkspaceOptions {
        save: SaveConfig::default(),
        clock: clock.clone(),
    };
    Workspace::open_with(WorkspaceStores::single(store.clone()), options)
        .await
        .unwrap()
}
