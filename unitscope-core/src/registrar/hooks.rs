//! Creation hooks.
//!
//! A [`HookSet`] holds one callback per unit kind. The registrar calls
//! exactly one of them each time a getter creates a new unit, and none on
//! cache hits.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::unit_ref::UnitRef;
use crate::error::{BoxError, RegistrarError};
use crate::unit::UnitKind;

/// Result returned by a creation hook.
pub type HookResult = Result<(), BoxError>;

type Hook = Arc<dyn Fn(&str, &UnitRef) -> HookResult + Send + Sync>;

fn noop() -> Hook {
    Arc::new(|_, _| Ok(()))
}

/// The three creation callbacks, fixed when a registrar is built.
#[derive(Clone)]
pub struct HookSet {
    on_create_event: Hook,
    on_create_effect: Hook,
    on_create_store: Hook,
}

impl HookSet {
    /// Create a hook set from all three callbacks.
    pub fn new<E, F, S>(on_create_event: E, on_create_effect: F, on_create_store: S) -> Self
    where
        E: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
        F: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
        S: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
    {
        Self {
            on_create_event: Arc::new(on_create_event),
            on_create_effect: Arc::new(on_create_effect),
            on_create_store: Arc::new(on_create_store),
        }
    }

    /// Start building a hook set. Hooks left unset do nothing.
    pub fn builder() -> HookSetBuilder {
        HookSetBuilder {
            hooks: Self::noop(),
        }
    }

    /// A hook set where every hook does nothing.
    pub fn noop() -> Self {
        Self {
            on_create_event: noop(),
            on_create_effect: noop(),
            on_create_store: noop(),
        }
    }

    /// Invoke the hook matching `kind`. Unknown values dispatch nothing.
    pub fn dispatch(&self, kind: UnitKind, label: &str, unit: &UnitRef) -> Result<(), RegistrarError> {
        let hook = match kind {
            UnitKind::Action => &self.on_create_event,
            UnitKind::EffectWrapper => &self.on_create_effect,
            UnitKind::Store => &self.on_create_store,
            UnitKind::Unknown => return Ok(()),
        };

        hook(label, unit).map_err(|source| {
            warn!(label, kind = %kind, error = %source, "creation hook failed");
            RegistrarError::Hook {
                label: label.to_owned(),
                source,
            }
        })
    }
}

impl Default for HookSet {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet").finish_non_exhaustive()
    }
}

/// Builder for [`HookSet`].
pub struct HookSetBuilder {
    hooks: HookSet,
}

impl HookSetBuilder {
    /// Called when a getter creates an action.
    pub fn on_create_event<H>(mut self, hook: H) -> Self
    where
        H: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_create_event = Arc::new(hook);
        self
    }

    /// Called when a getter creates an effect wrapper.
    pub fn on_create_effect<H>(mut self, hook: H) -> Self
    where
        H: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_create_effect = Arc::new(hook);
        self
    }

    /// Called when a getter creates a store.
    pub fn on_create_store<H>(mut self, hook: H) -> Self
    where
        H: Fn(&str, &UnitRef) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_create_store = Arc::new(hook);
        self
    }

    pub fn build(self) -> HookSet {
        self.hooks
    }
}
