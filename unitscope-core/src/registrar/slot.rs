//! Per-context slot table.
//!
//! Each context holds one [`ContextRegistry`] under a reserved key. It maps
//! slot IDs to their state and keeps the creation-ordered index of units.
//! Both live behind one mutex so a clean resets them together.
//!
//! # Slot States
//!
//! - absent: empty, the next getter call builds.
//! - `Building`: a factory is running. Same-thread callers get
//!   `Reentrant`; other threads wait on the condvar.
//! - `Populated`: cached until the next clean.
//!
//! A clean drops populated slots but keeps `Building` ones. The running
//! factory still owns its slot, commits into the cleaned registry and stays
//! the only unit its getter hands out.
//!
//! No lock is held while a factory or hook runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use super::unit_ref::{CachedValue, UnitRef};
use crate::context::ContextKey;
use crate::error::RegistrarError;

/// Storage key of the registry inside each execution context.
pub(crate) const REGISTRY_KEY: ContextKey<ContextRegistry> = ContextKey::new("unitscope.registry");

/// Identity of one getter's cache slot.
///
/// Minted once per `register` call. Clones of a getter share it; two
/// getters with the same label do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

impl SlotId {
    /// Generate a new unique slot ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

enum SlotState {
    Building { owner: ThreadId },
    Populated(CachedValue),
}

#[derive(Default)]
struct RegistryState {
    slots: HashMap<SlotId, SlotState>,
    index: Vec<UnitRef>,
}

/// The registrar's storage inside one execution context.
#[derive(Default)]
pub(crate) struct ContextRegistry {
    state: Mutex<RegistryState>,
    built: Condvar,
}

/// Outcome of looking up a slot.
pub(crate) enum Acquired<'a> {
    Cached(CachedValue),
    Build(BuildTicket<'a>),
}

impl ContextRegistry {
    /// Look up `slot`, claiming it for building if it is empty.
    pub(crate) fn acquire(&self, slot: SlotId, label: &str) -> Result<Acquired<'_>, RegistrarError> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        loop {
            let busy = match state.slots.get(&slot) {
                None => false,
                Some(SlotState::Populated(value)) => return Ok(Acquired::Cached(value.clone())),
                Some(SlotState::Building { owner, .. }) if *owner == me => {
                    return Err(RegistrarError::Reentrant {
                        label: label.to_owned(),
                    });
                }
                Some(SlotState::Building { .. }) => true,
            };

            if !busy {
                break;
            }
            self.built.wait(&mut state);
        }

        state.slots.insert(slot, SlotState::Building { owner: me });

        Ok(Acquired::Build(BuildTicket {
            registry: self,
            slot,
            finished: false,
        }))
    }

    /// Drop every populated slot and the index. Returns how many indexed
    /// units were dropped.
    pub(crate) fn clean(&self) -> usize {
        let mut state = self.state.lock();
        state
            .slots
            .retain(|_, slot| matches!(slot, SlotState::Building { .. }));
        let dropped = state.index.len();
        state.index.clear();
        dropped
    }

    /// Copy of the creation-ordered index.
    pub(crate) fn snapshot(&self) -> Vec<UnitRef> {
        self.state.lock().index.clone()
    }
}

/// Exclusive right to build one slot.
///
/// Dropping the ticket without committing (factory error or panic) returns
/// the slot to empty and wakes waiters.
pub(crate) struct BuildTicket<'a> {
    registry: &'a ContextRegistry,
    slot: SlotId,
    finished: bool,
}

impl BuildTicket<'_> {
    /// Store the built value. `unit` is appended to the index when given.
    pub(crate) fn commit(mut self, value: CachedValue, unit: Option<UnitRef>) {
        self.finished = true;

        {
            let mut state = self.registry.state.lock();
            state.slots.insert(self.slot, SlotState::Populated(value));
            if let Some(unit) = unit {
                state.index.push(unit);
            }
        }

        self.registry.built.notify_all();
    }
}

impl Drop for BuildTicket<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        {
            let mut state = self.registry.state.lock();
            if matches!(state.slots.get(&self.slot), Some(SlotState::Building { .. })) {
                state.slots.remove(&self.slot);
            }
        }

        self.registry.built.notify_all();
    }
}
