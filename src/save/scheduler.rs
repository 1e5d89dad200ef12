//! Per-key debounce scheduler.
//!
//! Holds, for each key, the latest payload and the deadline at which it becomes due.
//! Scheduling a key again replaces its payload and pushes its deadline out by the
//! full window. Nothing here sleeps: the owner polls with the current time.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Pending<P> {
    deadline: Duration,
    payload: P,
}

#[derive(Debug, Clone)]
pub struct DebounceScheduler<K, P> {
    window: Duration,
    pending: HashMap<K, Pending<P>>,
}

impl<K, P> DebounceScheduler<K, P>
where
    K: Eq + Hash + Ord + Clone,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Arm (or re-arm) `key` with `payload`. Returns true if an earlier payload was replaced.
    pub fn schedule(&mut self, key: K, payload: P, now: Duration) -> bool {
        let deadline = now + self.window;
        self.pending
            .insert(key, Pending { deadline, payload })
            .is_some()
    }

    /// Remove and return every entry whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<(K, P)> {
        let mut due_keys: Vec<(Duration, K)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, p)| (p.deadline, k.clone()))
            .collect();
        due_keys.sort();
        due_keys
            .into_iter()
            .filter_map(|(_, key)| self.pending.remove(&key).map(|p| (key, p.payload)))
            .collect()
    }

    /// Remove and return every entry regardless of deadline, earliest first.
    pub fn drain(&mut self) -> Vec<(K, P)> {
        let mut all: Vec<(Duration, K, P)> = self
            .pending
            .drain()
            .map(|(k, p)| (p.deadline, k, p.payload))
            .collect();
        all.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        all.into_iter().map(|(_, k, p)| (k, p)).collect()
    }

    /// Drop a pending entry without delivering it.
    pub fn discard(&mut self, key: &K) -> Option<P> {
        self.pending.remove(key).map(|p| p.payload)
    }

    /// Pending entries in no particular order.
    pub fn payloads(&self) -> impl Iterator<Item = (&K, &P)> + '_ {
        self.pending.iter().map(|(k, p)| (k, &p.payload))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
