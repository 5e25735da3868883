//! Execution context handles and typed keys.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::scope::{self, ContextGuard, Scoped};
use crate::error::ContextError;

type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Unique identifier for an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A typed key into context storage.
///
/// The name is the storage key; the type parameter fixes what is stored
/// under it. Keys are usually declared as constants next to their users.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Create a key with the given storage name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The storage name of this key.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

/// Handle to one execution context.
///
/// Cloning the handle is cheap and every clone refers to the same storage.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    id: ContextId,
    values: DashMap<&'static str, ErasedValue>,
}

impl ExecutionContext {
    /// Create a new, empty context. It is not active until entered.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: ContextId::next(),
                values: DashMap::new(),
            }),
        }
    }

    /// Get the context's unique ID.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The innermost context active on this thread.
    pub fn current() -> Result<Self, ContextError> {
        scope::current().ok_or(ContextError::NoActiveContext)
    }

    /// Check if any context is active on this thread.
    pub fn is_active() -> bool {
        scope::is_active()
    }

    /// Make this context the active one until the guard is dropped.
    pub fn enter(&self) -> ContextGuard {
        ContextGuard::push(self.clone())
    }

    /// Run `f` with this context active.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Wrap a future so that it runs inside this context on every poll.
    pub fn scope<F: Future>(&self, future: F) -> Scoped<F> {
        Scoped::new(self.clone(), future)
    }

    /// Check whether two handles refer to the same context.
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the value under `key`, initialising it with `init` on first access.
    ///
    /// `init` runs without any map lock held, so it may use this context.
    /// If two callers race, both may run `init`; the first insert wins and
    /// both get the winning value.
    pub fn get_or_init<T, F>(&self, key: &ContextKey<T>, init: F) -> Result<Arc<T>, ContextError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let existing = self
            .inner
            .values
            .get(&key.name())
            .map(|entry| Arc::clone(entry.value()));

        let value = match existing {
            Some(value) => value,
            None => {
                let fresh = Arc::new(init()) as ErasedValue;
                let entry = self.inner.values.entry(key.name()).or_insert(fresh);
                Arc::clone(entry.value())
            }
        };

        value
            .downcast::<T>()
            .map_err(|_| ContextError::KeyTypeMismatch { key: key.name() })
    }

    /// Read the value under `key`, if it has been initialised.
    pub fn read<T>(&self, key: &ContextKey<T>) -> Result<Option<Arc<T>>, ContextError>
    where
        T: Send + Sync + 'static,
    {
        let Some(value) = self
            .inner
            .values
            .get(&key.name())
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Ok(None);
        };

        value
            .downcast::<T>()
            .map(Some)
            .map_err(|_| ContextError::KeyTypeMismatch { key: key.name() })
    }

    /// Number of keys initialised in this context.
    pub fn key_count(&self) -> usize {
        self.inner.values.len()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.inner.id)
            .field("key_count", &self.key_count())
            .finish()
    }
}
