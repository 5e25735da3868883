//! Store Implementation
//!
//! A Store holds a current value and notifies its watchers whenever the
//! value is written.
//!
//! # Thread Safety
//!
//! The value is protected by a RwLock. Watchers are called after the lock is
//! released, with a clone of the value that was just written, so a watcher
//! may read or write the store again.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::event::Event;
use super::kind::{Readable, Sid, Unit};
use super::next_unit_id;
use super::watcher::{WatcherId, WatcherList};

/// A reactive store holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let increment = Event::<()>::new();
/// let count = Store::new(0).on(&increment, |n, _| n + 1);
///
/// increment.trigger(());
/// assert_eq!(count.get(), 1);
/// ```
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    /// Unique identifier for this store.
    id: u64,

    sid: Sid,

    /// The current value.
    value: RwLock<T>,

    /// Bumped on every write.
    version: AtomicU64,

    watchers: WatcherList<T>,
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new store with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                id: next_unit_id(),
                sid: Sid::new(),
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                watchers: WatcherList::new(),
            }),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Set a new value and notify watchers.
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut guard = self.inner.value.write();
            *guard = value;
            self.inner.version.fetch_add(1, Ordering::SeqCst);
            guard.clone()
        };

        self.inner.watchers.notify(&snapshot);
    }

    /// Update the value using a function of the current value.
    ///
    /// `f` runs under the write lock, so concurrent updates are not lost.
    /// It must not touch this store.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let snapshot = {
            let mut guard = self.inner.value.write();
            *guard = f(&guard);
            self.inner.version.fetch_add(1, Ordering::SeqCst);
            guard.clone()
        };

        self.inner.watchers.notify(&snapshot);
    }

    /// Attach a watcher called with every newly written value.
    pub fn watch<F>(&self, watcher: F) -> WatcherId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.watchers.add(watcher)
    }

    /// Detach a watcher. Returns false if it was not attached.
    pub fn unwatch(&self, id: WatcherId) -> bool {
        self.inner.watchers.remove(id)
    }

    /// Follow `event`: each trigger replaces the value with
    /// `reducer(current, payload)`.
    ///
    /// The subscription lives as long as the event does, independently of
    /// any registry the store was created through.
    pub fn on<P, F>(self, event: &Event<P>, reducer: F) -> Self
    where
        P: Send + Sync + 'static,
        F: Fn(&T, &P) -> T + Send + Sync + 'static,
    {
        let store = self.clone();
        event.watch(move |payload| store.update(|current| reducer(current, payload)));
        self
    }

    /// Check whether two handles refer to the same store.
    pub fn same_unit(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Two handles are equal when they refer to the same store, not when they
/// hold equal values.
impl<T> PartialEq for Store<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for Store<T> {}

impl<T> fmt::Debug for Store<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("sid", &self.inner.sid)
            .field("value", &*self.inner.value.read())
            .field("version", &self.inner.version.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T> Readable for Store<T> {
    fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    fn subscriber_count(&self) -> usize {
        self.inner.watchers.len()
    }
}

impl<T> Unit for Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn as_readable(&self) -> Option<&dyn Readable> {
        Some(self)
    }

    fn stamp(&self, sid: &str) {
        self.inner.sid.stamp(sid);
    }

    fn sid(&self) -> Option<String> {
        self.inner.sid.get()
    }
}
