//! Event Implementation
//!
//! An Event is a triggerable action. It carries no state of its own beyond a
//! trigger counter; triggering it hands the payload to every watcher in
//! attach order.
//!
//! Stores follow events through [`Store::on`](super::Store::on), which is
//! how an action changes state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::kind::{Sid, Triggerable, Unit};
use super::next_unit_id;
use super::watcher::{WatcherId, WatcherList};

/// A triggerable action carrying a payload of type `P`.
///
/// # Example
///
/// ```rust,ignore
/// let clicked = Event::<u32>::new();
/// clicked.watch(|n| println!("clicked {n} times"));
/// clicked.trigger(1);
/// ```
pub struct Event<P> {
    inner: Arc<EventInner<P>>,
}

struct EventInner<P> {
    /// Unique identifier for this event.
    id: u64,

    sid: Sid,

    watchers: WatcherList<P>,

    trigger_count: AtomicU64,
}

impl<P> Event<P>
where
    P: Send + Sync + 'static,
{
    /// Create a new event with no watchers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventInner {
                id: next_unit_id(),
                sid: Sid::new(),
                watchers: WatcherList::new(),
                trigger_count: AtomicU64::new(0),
            }),
        }
    }

    /// Get the event's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Trigger the event, calling every watcher with `payload`.
    pub fn trigger(&self, payload: P) {
        self.notify(&payload);
    }

    /// Trigger the event with a borrowed payload.
    pub(crate) fn notify(&self, payload: &P) {
        self.inner.trigger_count.fetch_add(1, Ordering::SeqCst);
        self.inner.watchers.notify(payload);
    }

    /// Attach a watcher. It runs on every later trigger.
    pub fn watch<F>(&self, watcher: F) -> WatcherId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.inner.watchers.add(watcher)
    }

    /// Detach a watcher. Returns false if it was not attached.
    pub fn unwatch(&self, id: WatcherId) -> bool {
        self.inner.watchers.remove(id)
    }

    /// Check whether two handles refer to the same event.
    pub fn same_unit(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P> Default for Event<P>
where
    P: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Event<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Two handles are equal when they refer to the same event.
impl<P> PartialEq for Event<P> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P> Eq for Event<P> {}

impl<P> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("sid", &self.inner.sid)
            .field("trigger_count", &self.inner.trigger_count.load(Ordering::SeqCst))
            .field("watcher_count", &self.inner.watchers.len())
            .finish()
    }
}

impl<P> Triggerable for Event<P> {
    fn trigger_count(&self) -> u64 {
        self.inner.trigger_count.load(Ordering::SeqCst)
    }

    fn watcher_count(&self) -> usize {
        self.inner.watchers.len()
    }
}

impl<P> Unit for Event<P>
where
    P: Send + Sync + 'static,
{
    fn as_triggerable(&self) -> Option<&dyn Triggerable> {
        Some(self)
    }

    fn stamp(&self, sid: &str) {
        self.inner.sid.stamp(sid);
    }

    fn sid(&self) -> Option<String> {
        self.inner.sid.get()
    }
}
