//! Debounced persistence of pane widths and tree expansion.
//!
//! Drags and folder toggles arrive in bursts. Only the last value of a burst is
//! written, and every write is a read-modify-write of the settings record so it
//! never overwrites fields changed by someone else in the meantime.

use super::clock::Clock;
use super::scheduler::DebounceScheduler;
use crate::config::SaveConfig;
use crate::settings::{PaneWidths, SettingsStore};
use crate::types::NodeId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

struct Pending {
    widths: DebounceScheduler<(), PaneWidths>,
    expanded: DebounceScheduler<(), Vec<NodeId>>,
}

pub struct LayoutPersister {
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
    pending: Mutex<Pending>,
}

impl LayoutPersister {
    pub fn new(
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
        widths_window: Duration,
        expanded_window: Duration,
    ) -> Self {
        Self {
            settings,
            clock,
            pending: Mutex::new(Pending {
                widths: DebounceScheduler::new(widths_window),
                expanded: DebounceScheduler::new(expanded_window),
            }),
        }
    }

    pub fn from_config(settings: SettingsStore, clock: Arc<dyn Clock>, config: &SaveConfig) -> Self {
        Self::new(
            settings,
            clock,
            Duration::from_millis(config.pane_width_debounce_ms),
            Duration::from_millis(config.expanded_debounce_ms),
        )
    }

    pub fn set_widths(&self, widths: PaneWidths) {
        let now = self.clock.now();
        self.pending.lock().widths.schedule((), widths.clamped(), now);
    }

    pub fn set_expanded(&self, folder_ids: Vec<NodeId>) {
        let now = self.clock.now();
        self.pending.lock().expanded.schedule((), folder_ids, now);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        let pending = self.pending.lock();
        match (pending.widths.next_deadline(), pending.expanded.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_pending(&self) -> bool {
        let pending = self.pending.lock();
        !pending.widths.is_empty() || !pending.expanded.is_empty()
    }

    /// Write whatever has been quiet long enough. Returns the number of writes made.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        let (widths, expanded) = {
            let mut pending = self.pending.lock();
            (pending.widths.take_due(now), pending.expanded.take_due(now))
        };
        self.write(last_payload(widths), last_payload(expanded))
    }

    /// Write everything pending now.
    pub fn flush(&self) -> usize {
        let (widths, expanded) = {
            let mut pending = self.pending.lock();
            (pending.widths.drain(), pending.expanded.drain())
        };
        self.write(last_payload(widths), last_payload(expanded))
    }

    fn write(&self, widths: Option<PaneWidths>, expanded: Option<Vec<NodeId>>) -> usize {
        if widths.is_none() && expanded.is_none() {
            return 0;
        }
        let result = self.settings.update(|settings| {
            if let Some(widths) = widths {
                settings.ui.set_widths(widths);
            }
            if let Some(expanded) = expanded {
                settings.ui.expanded_folder_ids = Some(expanded);
            }
        });
        match result {
            Ok(_) => {
                debug!("Layout persisted");
                1
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist layout");
                0
            }
        }
    }
}

fn last_payload<P>(due: Vec<((), P)>) -> Option<P> {
    due.into_iter().last().map(|(_, payload)| payload)
}
