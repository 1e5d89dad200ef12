//! Save Coordinator
//!
//! Decouples keystrokes from storage writes. Each edit re-arms a per-file debounce;
//! once a file has been quiet for the content window its latest text is committed to
//! the content store. A successful commit arms a second, longer debounce for
//! write-back to a linked disk file.
//!
//! Per file: `Clean -> Dirty (edit) -> Saving (window elapsed) -> Clean`. An edit that
//! lands while a save is in flight leaves the file `Dirty` with a fresh deadline; only
//! the last edit before a quiet period is guaranteed to be committed.
//!
//! A failed save is not retried on a timer. Its text is held until the next edit
//! replaces it or a [`SaveCoordinator::flush`] tries again, and no write-back is armed
//! for it. [`SaveCoordinator::has_unsaved`] reports such files.

use super::clock::Clock;
use super::scheduler::DebounceScheduler;
use crate::config::SaveConfig;
use crate::store::{ContentStore, FileContent, HandleStore};
use crate::types::{now_millis, NodeId};
use crate::writeback::{write_back, WriteBackOutcome};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Save state of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    Clean,
    Dirty,
    Saving,
}

/// Debounce windows used by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTimings {
    pub content: Duration,
    pub write_back: Duration,
}

impl Default for SaveTimings {
    fn default() -> Self {
        Self {
            content: Duration::from_millis(450),
            write_back: Duration::from_millis(900),
        }
    }
}

impl From<&SaveConfig> for SaveTimings {
    fn from(config: &SaveConfig) -> Self {
        Self {
            content: Duration::from_millis(config.content_debounce_ms),
            write_back: Duration::from_millis(config.write_back_debounce_ms),
        }
    }
}

/// What a tick or flush committed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<NodeId>,
    pub failed: Vec<NodeId>,
    pub written_back: Vec<(NodeId, WriteBackOutcome)>,
}

impl SaveReport {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty() && self.written_back.is_empty()
    }
}

struct Inner {
    saves: DebounceScheduler<NodeId, String>,
    write_backs: DebounceScheduler<NodeId, String>,
    states: HashMap<NodeId, DocState>,
    // Text handed to the content store and not yet acknowledged
    in_flight: HashMap<NodeId, String>,
    // Forgotten while a save was in flight; that save must not survive
    forgotten: HashSet<NodeId>,
    failed: HashMap<NodeId, String>,
}

impl Inner {
    fn begin_saving(&mut self, due: &[(NodeId, String)]) {
        for (file_id, text) in due {
            self.states.insert(file_id.clone(), DocState::Saving);
            self.in_flight.insert(file_id.clone(), text.clone());
        }
    }
}

pub struct SaveCoordinator {
    content: Arc<dyn ContentStore>,
    handles: Arc<dyn HandleStore>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl SaveCoordinator {
    pub fn new(
        content: Arc<dyn ContentStore>,
        handles: Arc<dyn HandleStore>,
        clock: Arc<dyn Clock>,
        timings: SaveTimings,
    ) -> Self {
        Self {
            content,
            handles,
            clock,
            inner: Mutex::new(Inner {
                saves: DebounceScheduler::new(timings.content),
                write_backs: DebounceScheduler::new(timings.write_back),
                states: HashMap::new(),
                in_flight: HashMap::new(),
                forgotten: HashSet::new(),
                failed: HashMap::new(),
            }),
        }
    }

    /// Record an edit. Pending saves for other files are unaffected.
    pub fn on_edit(&self, file_id: &str, text: impl Into<String>) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let rearmed = inner.saves.schedule(file_id.to_string(), text.into(), now);
        inner.states.insert(file_id.to_string(), DocState::Dirty);
        inner.failed.remove(file_id);
        inner.forgotten.remove(file_id);
        debug!(file_id, rearmed, "Edit scheduled for save");
    }

    pub fn state(&self, file_id: &str) -> DocState {
        self.inner
            .lock()
            .states
            .get(file_id)
            .copied()
            .unwrap_or(DocState::Clean)
    }

    /// Earliest pending deadline across saves and write-backs, on the coordinator's clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        match (inner.saves.next_deadline(), inner.write_backs.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_pending(&self) -> bool {
        let inner = self.inner.lock();
        !inner.saves.is_empty() || !inner.write_backs.is_empty()
    }

    /// Whether a file holds text that a failed save never committed.
    pub fn has_unsaved(&self, file_id: &str) -> bool {
        self.inner.lock().failed.contains_key(file_id)
    }

    /// Texts not yet in the content store: pending, in flight, or failed.
    pub fn uncommitted_texts(&self) -> Vec<(NodeId, String)> {
        let inner = self.inner.lock();
        inner
            .saves
            .payloads()
            .chain(inner.in_flight.iter())
            .chain(inner.failed.iter())
            .map(|(id, text)| (id.clone(), text.clone()))
            .collect()
    }

    /// Drop anything pending for a file that no longer exists.
    ///
    /// A save already in flight for it is undone once the store acknowledges it.
    pub fn forget(&self, file_id: &str) {
        let key = file_id.to_string();
        let mut inner = self.inner.lock();
        inner.saves.discard(&key);
        inner.write_backs.discard(&key);
        inner.states.remove(&key);
        inner.failed.remove(&key);
        if inner.in_flight.contains_key(&key) {
            inner.forgotten.insert(key);
        }
    }

    /// Commit every save and write-back whose quiet period has elapsed.
    pub async fn tick(&self) -> SaveReport {
        let now = self.clock.now();
        let due_saves = {
            let mut inner = self.inner.lock();
            let due = inner.saves.take_due(now);
            inner.begin_saving(&due);
            due
        };

        let mut report = SaveReport::default();
        self.commit_saves(due_saves, &mut report).await;

        let due_write_backs = self.inner.lock().write_backs.take_due(self.clock.now());
        self.run_write_backs(due_write_backs, &mut report).await;
        report
    }

    /// Commit everything pending immediately, ignoring deadlines. Text from earlier
    /// failed saves is tried once more.
    pub async fn flush(&self) -> SaveReport {
        let pending = {
            let mut inner = self.inner.lock();
            let mut pending = inner.saves.drain();
            let mut retry: Vec<(NodeId, String)> = inner.failed.drain().collect();
            retry.sort();
            pending.extend(retry);
            inner.begin_saving(&pending);
            pending
        };

        let mut report = SaveReport::default();
        self.commit_saves(pending, &mut report).await;

        let write_backs = self.inner.lock().write_backs.drain();
        self.run_write_backs(write_backs, &mut report).await;
        report
    }

    async fn commit_saves(&self, due: Vec<(NodeId, String)>, report: &mut SaveReport) {
        for (file_id, text) in due {
            let record = FileContent {
                file_id: file_id.clone(),
                content: text.clone(),
                updated_at: now_millis(),
            };
            let result = self.content.put_content(record).await;

            let forgotten = {
                let now = self.clock.now();
                let mut inner = self.inner.lock();
                inner.in_flight.remove(&file_id);
                if inner.forgotten.remove(&file_id) {
                    true
                } else {
                    let saving = inner.states.get(&file_id) == Some(&DocState::Saving);
                    match &result {
                        Ok(()) => {
                            if saving {
                                inner.states.insert(file_id.clone(), DocState::Clean);
                            }
                            inner.write_backs.schedule(file_id.clone(), text.clone(), now);
                        }
                        Err(_) => {
                            if saving {
                                inner.states.insert(file_id.clone(), DocState::Dirty);
                                inner.failed.insert(file_id.clone(), text.clone());
                            }
                        }
                    }
                    false
                }
            };

            if forgotten {
                debug!(file_id = %file_id, "File removed during save, dropping its content");
                if result.is_ok() {
                    if let Err(e) = self.content.delete_content(&file_id).await {
                        warn!(file_id = %file_id, error = %e, "Failed to drop late save");
                    }
                }
                continue;
            }
            match result {
                Ok(()) => {
                    debug!(file_id = %file_id, bytes = text.len(), "Content saved");
                    report.saved.push(file_id);
                }
                Err(e) => {
                    warn!(file_id = %file_id, error = %e, "Content save failed");
                    report.failed.push(file_id);
                }
            }
        }
    }

    async fn run_write_backs(&self, due: Vec<(NodeId, String)>, report: &mut SaveReport) {
        for (file_id, text) in due {
            let outcome = write_back(self.handles.as_ref(), &file_id, &text).await;
            report.written_back.push((file_id, outcome));
        }
    }
}

/// Spawn a task that ticks the coordinator whenever a deadline comes due.
///
/// `idle_poll` bounds how long the task sleeps when nothing is pending. Abort the
/// returned handle to stop it; call [`SaveCoordinator::flush`] first to keep edits.
pub fn spawn_driver(
    coordinator: Arc<SaveCoordinator>,
    idle_poll: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = match coordinator.next_deadline() {
                Some(deadline) => deadline
                    .saturating_sub(coordinator.clock.now())
                    .min(idle_poll),
                None => idle_poll,
            };
            tokio::time::sleep(wait).await;
            let report = coordinator.tick().await;
            if !report.is_empty() {
                debug!(
                    saved = report.saved.len(),
                    failed = report.failed.len(),
                    written_back = report.written_back.len(),
                    "Save tick"
                );
            }
        }
    })
}
