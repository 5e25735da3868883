//! Registrar and getters.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use super::hooks::HookSet;
use super::slot::{Acquired, ContextRegistry, SlotId, REGISTRY_KEY};
use super::unit_ref::{CachedValue, ErasedUnit, UnitRef};
use crate::context::ExecutionContext;
use crate::error::{BoxError, RegistrarError, Result};
use crate::unit::{classify, Unit};

type Factory<A, T> = Arc<dyn Fn(A) -> Result<T, BoxError> + Send + Sync>;

/// Wraps factories into context-memoized getters.
///
/// # Example
///
/// ```rust,ignore
/// let registrar = Registrar::new(HookSet::builder()
///     .on_create_store(|label, _| { println!("store {label}"); Ok(()) })
///     .build());
///
/// let get_counter = registrar.register("counter", |_: ()| Store::new(0));
///
/// run_in_context(|| {
///     let a = get_counter.get()?;
///     let b = get_counter.get()?;
///     assert!(a.same_unit(&b));
///     Ok::<_, RegistrarError>(())
/// })?;
/// ```
#[derive(Clone, Debug)]
pub struct Registrar {
    hooks: Arc<HookSet>,
}

impl Registrar {
    /// Create a registrar dispatching to `hooks`.
    pub fn new(hooks: HookSet) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }

    /// Wrap an infallible factory.
    pub fn register<A, T, F>(&self, label: impl Into<String>, factory: F) -> Getter<A, T>
    where
        A: 'static,
        T: Unit + Clone,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        self.register_fallible(label, move |args| Ok::<_, Infallible>(factory(args)))
    }

    /// Wrap a factory that may fail. A failed call leaves the slot empty.
    pub fn register_fallible<A, T, E, F>(&self, label: impl Into<String>, factory: F) -> Getter<A, T>
    where
        A: 'static,
        T: Unit + Clone,
        E: Into<BoxError>,
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        let label: String = label.into();
        let slot = SlotId::new();
        trace!(label = %label, slot = %slot, "registered getter");

        Getter {
            slot,
            label: Arc::from(label),
            factory: Arc::new(move |args: A| -> Result<T, BoxError> { factory(args).map_err(Into::into) }),
            hooks: Arc::clone(&self.hooks),
            _marker: PhantomData,
        }
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new(HookSet::noop())
    }
}

/// A context-memoized accessor for one unit.
///
/// The first call in a context runs the factory; every later call in that
/// context returns the same unit and ignores its arguments.
pub struct Getter<A, T> {
    slot: SlotId,
    label: Arc<str>,
    factory: Factory<A, T>,
    hooks: Arc<HookSet>,
    _marker: PhantomData<fn(A) -> T>,
}

impl<A, T> Getter<A, T>
where
    T: Unit + Clone,
{
    /// The label this getter stamps on its unit.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The identity of this getter's cache slot.
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    /// Get the unit for the active context, creating it on first use.
    pub fn call(&self, args: A) -> Result<T> {
        let context = ExecutionContext::current()?;
        let registry = context.get_or_init(&REGISTRY_KEY, ContextRegistry::default)?;

        let ticket = match registry.acquire(self.slot, &self.label)? {
            Acquired::Cached(value) => {
                trace!(label = %self.label, slot = %self.slot, "unit cache hit");
                return self.downcast(&value);
            }
            Acquired::Build(ticket) => ticket,
        };

        let value = (self.factory)(args).map_err(|source| RegistrarError::Factory {
            label: self.label.to_string(),
            source,
        })?;

        let kind = classify(&value);
        if kind.is_unit() {
            value.stamp(&self.label);
        }

        let cached: CachedValue = Arc::new(value.clone());
        let unit = kind
            .is_unit()
            .then(|| UnitRef::new(Arc::clone(&self.label), kind, self.slot, Arc::clone(&cached)));

        ticket.commit(cached, unit.clone());
        debug!(
            label = %self.label,
            slot = %self.slot,
            kind = %kind,
            context = %context.id(),
            "created unit"
        );

        if let Some(unit) = &unit {
            self.hooks.dispatch(kind, &self.label, unit)?;
        }

        Ok(value)
    }

    fn downcast(&self, value: &CachedValue) -> Result<T> {
        value
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| RegistrarError::SlotTypeMismatch {
                label: self.label.to_string(),
            })
    }
}

impl<T> Getter<(), T>
where
    T: Unit + Clone,
{
    /// Shorthand for `call(())`.
    pub fn get(&self) -> Result<T> {
        self.call(())
    }
}

impl<A, T> Clone for Getter<A, T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            label: Arc::clone(&self.label),
            factory: Arc::clone(&self.factory),
            hooks: Arc::clone(&self.hooks),
            _marker: PhantomData,
        }
    }
}

impl<A, T> fmt::Debug for Getter<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Getter")
            .field("label", &self.label)
            .field("slot", &self.slot)
            .finish()
    }
}
