//! Unitscope Core
//!
//! This crate provides a context-scoped, memoizing registrar for reactive
//! units. It implements:
//!
//! - Execution contexts (isolated per-execution storage, explicit async
//!   propagation)
//! - Minimal reactive units (events, effects, stores) and capability-based
//!   kind classification
//! - The registrar: factories wrapped into getters that run at most once per
//!   context, with one creation hook per unit
//! - Registry maintenance (clean, expose, describe)
//!
//! # Architecture
//!
//! - `context`: execution contexts and the typed key accessor
//! - `unit`: unit kinds, the `Unit` capability trait, `Event`, `Effect`,
//!   `Store`
//! - `registrar`: hooks, getters, per-context slot table, maintenance
//! - `error`: error types
//!
//! # Example
//!
//! ```rust,ignore
//! use unitscope_core::context::run_in_context;
//! use unitscope_core::registrar::{HookSet, Registrar};
//! use unitscope_core::unit::Store;
//!
//! let registrar = Registrar::new(
//!     HookSet::builder()
//!         .on_create_store(|label, unit| {
//!             println!("created store {label} ({:?})", unit.sid());
//!             Ok(())
//!         })
//!         .build(),
//! );
//!
//! let get_counter = registrar.register("counter", |_: ()| Store::new(0));
//!
//! run_in_context(|| {
//!     let counter = get_counter.get()?;
//!     counter.set(1);
//!
//!     // Same context, same store.
//!     assert_eq!(get_counter.get()?.get(), 1);
//!     Ok::<_, unitscope_core::RegistrarError>(())
//! })?;
//! ```

pub mod context;
pub mod error;
pub mod registrar;
pub mod unit;

pub use context::{run_in_context, ExecutionContext};
pub use error::{BoxError, ContextError, RegistrarError, Result};
pub use registrar::{clean, describe, expose, Getter, HookSet, Registrar, UnitRef};
pub use unit::{classify, Effect, Event, Store, Unit, UnitKind};
