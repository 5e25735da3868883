//! Watcher bookkeeping shared by events and stores.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Unique identifier for a watcher.
///
/// Returned when a watcher is attached and used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Generate a new unique watcher ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered list of watcher callbacks.
pub(crate) struct WatcherList<T> {
    entries: RwLock<Vec<(WatcherId, Callback<T>)>>,
}

impl<T> WatcherList<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add<F>(&self, callback: F) -> WatcherId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = WatcherId::new();
        self.entries.write().push((id, Arc::new(callback)));
        id
    }

    pub(crate) fn remove(&self, id: WatcherId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Call every watcher with `value`, in attach order.
    ///
    /// Callbacks run on a snapshot taken before the first call, so a
    /// callback may attach or detach watchers without deadlocking.
    pub(crate) fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }
}
