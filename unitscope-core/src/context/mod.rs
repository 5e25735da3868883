//! Execution Contexts
//!
//! An execution context is the isolated key-value storage that lives for the
//! duration of one logical execution (a request, a test run, a job). The
//! registrar keeps its per-context cache inside it, so every context gets its
//! own independent set of units even when getters are shared.
//!
//! # Propagation
//!
//! Contexts are entered explicitly. Synchronous code runs inside
//! [`ExecutionContext::run`] (or holds the guard returned by
//! [`ExecutionContext::enter`]); everything called from there sees the context
//! through [`ExecutionContext::current`].
//!
//! Asynchronous code must carry the context across `.await` points itself:
//! wrap the future with [`ExecutionContext::scope`] and the context is
//! re-entered on every poll, including after the task moves to another worker
//! thread. A spawned task never inherits a context implicitly.
//!
//! ```rust,ignore
//! let ctx = ExecutionContext::current()?;
//! tokio::spawn(ctx.scope(async move {
//!     let store = get_store.get()?;
//!     // ...
//! }));
//! ```

mod execution;
mod scope;

pub use execution::{ContextId, ContextKey, ExecutionContext};
pub use scope::{ContextGuard, Scoped};

use std::sync::Arc;

use crate::error::ContextError;

/// Run `f` inside a fresh execution context and return its result.
///
/// The context is dropped once `f` returns, unless a handle to it escaped
/// (for example into a spawned task).
pub fn run_in_context<R>(f: impl FnOnce() -> R) -> R {
    ExecutionContext::new().run(f)
}

/// Get the value under `key` in the active context, initialising it on first
/// access.
pub fn get_or_init<T, F>(key: &ContextKey<T>, init: F) -> Result<Arc<T>, ContextError>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T,
{
    ExecutionContext::current()?.get_or_init(key, init)
}

/// Read the value under `key` in the active context, if any.
pub fn read<T>(key: &ContextKey<T>) -> Result<Option<Arc<T>>, ContextError>
where
    T: Send + Sync + 'static,
{
    ExecutionContext::current()?.read(key)
}
