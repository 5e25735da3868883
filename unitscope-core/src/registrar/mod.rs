//! Unit Registrar
//!
//! The registrar turns unit factories into getters that are memoized per
//! execution context.
//!
//! # How It Works
//!
//! 1. [`Registrar::register`] wraps a factory and mints a fresh [`SlotId`]
//!    for it. Getters are cheap to clone and are meant to be shared across
//!    contexts (module-level statics, app state).
//!
//! 2. On a getter call, the active context's registry is looked up (and
//!    created on first use). If the slot is populated, the cached unit is
//!    returned and the call's arguments are dropped.
//!
//! 3. Otherwise the factory runs. The result is classified; a recognized
//!    unit is stamped with the label, appended to the context's index and
//!    cached, and then exactly one creation hook is dispatched.
//!
//! # Failure Semantics
//!
//! - A factory error or panic leaves the slot empty; the next call retries.
//! - A hook error is returned to the caller, but the unit stays cached and
//!   indexed. Later calls return it without running any hook.
//! - A getter re-entered from its own factory fails with
//!   [`RegistrarError::Reentrant`](crate::error::RegistrarError::Reentrant).
//!
//! # Maintenance
//!
//! [`clean`] forgets every cached unit in the active context and
//! [`expose`] / [`describe`] list what has been created since.

mod hooks;
mod slot;
mod unit_ref;
mod getter;
mod maintenance;

pub use hooks::{HookResult, HookSet, HookSetBuilder};
pub use slot::SlotId;
pub use unit_ref::{UnitRecord, UnitRef};
pub use getter::{Getter, Registrar};
pub use maintenance::{clean, describe, expose};
