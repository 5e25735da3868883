//! Reactive Units
//!
//! Units are the small reactive primitives the registrar hands out. There
//! are three kinds:
//!
//! - [`Event`]: a triggerable action. Triggering it calls every watcher with
//!   the payload.
//! - [`Effect`]: wraps an asynchronous, side-effecting handler and counts
//!   runs in flight.
//! - [`Store`]: holds a current value and notifies watchers on change. A
//!   store can follow an event through [`Store::on`].
//!
//! The types here are intentionally minimal. There is no scheduler and no
//! dependency graph: everything runs synchronously on the caller's thread,
//! except the effect handler's future, which runs wherever it is awaited.
//!
//! # Classification
//!
//! The registrar does not know about these concrete types. It asks each
//! produced value which capabilities it exposes through the [`Unit`] trait
//! and turns that into a closed [`UnitKind`] with [`classify`]. Any type can
//! take part by implementing [`Unit`]; a type that exposes no capability is
//! [`UnitKind::Unknown`].

mod kind;
mod watcher;
mod event;
mod effect;
mod store;

pub use kind::{classify, Readable, Runnable, Sid, Triggerable, Unit, UnitKind};
pub use watcher::WatcherId;
pub use event::Event;
pub use effect::Effect;
pub use store::Store;

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique unit IDs.
static UNIT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique unit ID.
fn next_unit_id() -> u64 {
    UNIT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}
