//! Active context tracking.
//!
//! We use a thread-local stack to track which execution context is active.
//! Entering a context pushes it; dropping the guard pops it. Nesting is
//! allowed and the innermost context wins.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use smallvec::SmallVec;
use tracing::trace;

use super::execution::{ContextId, ExecutionContext};

thread_local! {
    static ACTIVE: RefCell<SmallVec<[ExecutionContext; 4]>> = RefCell::new(SmallVec::new());
}

pub(super) fn current() -> Option<ExecutionContext> {
    ACTIVE.with(|stack| stack.borrow().last().cloned())
}

pub(super) fn is_active() -> bool {
    ACTIVE.with(|stack| !stack.borrow().is_empty())
}

/// Guard that pops the context when dropped.
///
/// The guard is tied to the thread that created it, so the stack stays
/// balanced even if the code inside panics.
pub struct ContextGuard {
    id: ContextId,
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    pub(super) fn push(context: ExecutionContext) -> Self {
        let id = context.id();
        trace!(context = %id, "entering execution context");

        ACTIVE.with(|stack| stack.borrow_mut().push(context));

        Self {
            id,
            _not_send: PhantomData,
        }
    }

    /// ID of the context this guard keeps active.
    pub fn context_id(&self) -> ContextId {
        self.id
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(context) = popped {
                debug_assert_eq!(
                    context.id(),
                    self.id,
                    "ContextGuard mismatch: expected {}, got {}",
                    self.id,
                    context.id()
                );
            }
        });
    }
}

/// A future that re-enters its execution context on every poll.
///
/// Created by [`ExecutionContext::scope`].
pub struct Scoped<F> {
    context: ExecutionContext,
    future: Pin<Box<F>>,
}

impl<F> Scoped<F> {
    pub(super) fn new(context: ExecutionContext, future: F) -> Self {
        Self {
            context,
            future: Box::pin(future),
        }
    }

    /// The context this future runs in.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let _guard = this.context.enter();
        this.future.as_mut().poll(cx)
    }
}
