//! Effect Implementation
//!
//! An Effect wraps a side-effecting, asynchronous handler. Running it
//! returns the handler's future; the effect itself only counts runs and
//! announces successful results on its `done` event.
//!
//! Nothing here schedules the future. The caller awaits it on whatever
//! runtime it uses. To keep the registrar's context visible inside the
//! handler, wrap the run with
//! [`ExecutionContext::scope`](crate::context::ExecutionContext::scope).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::event::Event;
use super::kind::{Runnable, Sid, Unit};
use super::next_unit_id;
use crate::error::BoxError;

type BoxFuture<R> = Pin<Box<dyn Future<Output = Result<R, BoxError>> + Send>>;
type Handler<P, R> = Arc<dyn Fn(P) -> BoxFuture<R> + Send + Sync>;

/// An asynchronous side effect taking `P` and producing `R`.
///
/// # Example
///
/// ```rust,ignore
/// let fetch_user = Effect::new(|id: u64| async move {
///     Ok::<_, std::io::Error>(format!("user-{id}"))
/// });
///
/// let name = fetch_user.run(7).await?;
/// ```
pub struct Effect<P, R> {
    inner: Arc<EffectInner<P, R>>,
}

struct EffectInner<P, R> {
    /// Unique identifier for this effect.
    id: u64,

    sid: Sid,

    /// The wrapped handler.
    handler: Handler<P, R>,

    /// Number of runs started.
    run_count: AtomicU64,

    /// Number of runs not finished yet.
    pending: AtomicUsize,

    /// Fired with every successful result.
    done: Event<R>,
}

/// Decrements the pending counter when a run finishes or is dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<P, R> Effect<P, R>
where
    P: Send + 'static,
    R: Send + Sync + 'static,
{
    /// Create a new effect around `handler`.
    pub fn new<F, Fut, E>(handler: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let handler: Handler<P, R> = Arc::new(move |params: P| -> BoxFuture<R> {
            let future = handler(params);
            Box::pin(async move { future.await.map_err(Into::<BoxError>::into) })
        });

        Self {
            inner: Arc::new(EffectInner {
                id: next_unit_id(),
                sid: Sid::new(),
                handler,
                run_count: AtomicU64::new(0),
                pending: AtomicUsize::new(0),
                done: Event::new(),
            }),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Run the handler with `params` and wait for its result.
    ///
    /// On success the result is also announced on [`Effect::done`].
    pub async fn run(&self, params: P) -> Result<R, BoxError> {
        self.inner.run_count.fetch_add(1, Ordering::SeqCst);
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        let _pending = PendingGuard(&self.inner.pending);

        let result = (self.inner.handler)(params).await;

        if let Ok(value) = &result {
            self.inner.done.notify(value);
        }

        result
    }

    /// Event fired with each successful result.
    pub fn done(&self) -> Event<R> {
        self.inner.done.clone()
    }

    /// Check whether two handles refer to the same effect.
    pub fn same_unit(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P, R> Clone for Effect<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Two handles are equal when they refer to the same effect.
impl<P, R> PartialEq for Effect<P, R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P, R> Eq for Effect<P, R> {}

impl<P, R> fmt::Debug for Effect<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("sid", &self.inner.sid)
            .field("run_count", &self.inner.run_count.load(Ordering::SeqCst))
            .field("pending", &self.inner.pending.load(Ordering::SeqCst))
            .finish()
    }
}

impl<P, R> Runnable for Effect<P, R> {
    fn run_count(&self) -> u64 {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }
}

impl<P, R> Unit for Effect<P, R>
where
    P: Send + 'static,
    R: Send + Sync + 'static,
{
    fn as_runnable(&self) -> Option<&dyn Runnable> {
        Some(self)
    }

    fn stamp(&self, sid: &str) {
        self.inner.sid.stamp(sid);
    }

    fn sid(&self) -> Option<String> {
        self.inner.sid.get()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
