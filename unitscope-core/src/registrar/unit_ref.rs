//! Type-erased handles to created units.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::slot::SlotId;
use crate::unit::{Unit, UnitKind};

/// Object-safe view of a cached unit.
pub(crate) trait ErasedUnit: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn stamped_sid(&self) -> Option<String>;
}

impl<T: Unit> ErasedUnit for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn stamped_sid(&self) -> Option<String> {
        self.sid()
    }
}

pub(crate) type CachedValue = Arc<dyn ErasedUnit>;

/// A created unit as seen by hooks and by [`expose`](super::expose).
///
/// The handle shares the cached unit; [`UnitRef::downcast`] returns a clone
/// of the concrete handle, which refers to the same object the getter
/// returned.
#[derive(Clone)]
pub struct UnitRef {
    label: Arc<str>,
    kind: UnitKind,
    slot: SlotId,
    value: CachedValue,
}

impl UnitRef {
    pub(crate) fn new(label: Arc<str>, kind: UnitKind, slot: SlotId, value: CachedValue) -> Self {
        Self {
            label,
            kind,
            slot,
            value,
        }
    }

    /// The label the getter was registered with.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// The slot of the getter that created this unit.
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    /// The unit's stamped identifier.
    pub fn sid(&self) -> Option<String> {
        self.value.stamped_sid()
    }

    /// Check whether the unit is a `U`.
    pub fn is<U: Unit>(&self) -> bool {
        self.value.as_any().is::<U>()
    }

    /// Get the concrete unit handle back.
    pub fn downcast<U: Unit + Clone>(&self) -> Option<U> {
        self.value.as_any().downcast_ref::<U>().cloned()
    }

    /// Check whether two refs point at the same cached unit.
    pub fn same_unit(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Serializable summary of this unit.
    pub fn record(&self) -> UnitRecord {
        UnitRecord {
            label: self.label.to_string(),
            sid: self.sid(),
            kind: self.kind,
            slot: self.slot.raw(),
        }
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRef")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Serializable description of a created unit, for tracing dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub label: String,
    pub sid: Option<String>,
    pub kind: UnitKind,
    pub slot: u64,
}
