//! Unit kinds and capability-based classification.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The closed set of unit kinds the registrar dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A triggerable action ([`super::Event`]).
    Action,

    /// A wrapper around an asynchronous side effect ([`super::Effect`]).
    EffectWrapper,

    /// A value holder ([`super::Store`]).
    Store,

    /// Anything else. Not stamped, not indexed, no hook fires.
    Unknown,
}

impl UnitKind {
    /// True for every kind except [`UnitKind::Unknown`].
    pub fn is_unit(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::EffectWrapper => "effect",
            Self::Store => "store",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability: can be triggered.
pub trait Triggerable {
    /// Number of times the action has been triggered.
    fn trigger_count(&self) -> u64;

    /// Number of watchers currently attached.
    fn watcher_count(&self) -> usize;
}

/// Capability: runs a side effect.
pub trait Runnable {
    /// Number of runs started so far.
    fn run_count(&self) -> u64;

    /// Number of runs currently in flight.
    fn pending(&self) -> usize;
}

/// Capability: holds a readable value.
pub trait Readable {
    /// Monotonic counter bumped on every write.
    fn version(&self) -> u64;

    /// Number of watchers currently attached.
    fn subscriber_count(&self) -> usize;
}

/// A value the registrar can classify and stamp.
///
/// Every method has a default, so a plain resource type can implement
/// `Unit` with an empty impl block and be cached as [`UnitKind::Unknown`].
pub trait Unit: Send + Sync + 'static {
    fn as_triggerable(&self) -> Option<&dyn Triggerable> {
        None
    }

    fn as_runnable(&self) -> Option<&dyn Runnable> {
        None
    }

    fn as_readable(&self) -> Option<&dyn Readable> {
        None
    }

    /// Record the stable identifier of this unit.
    fn stamp(&self, _sid: &str) {}

    /// The stable identifier, once stamped.
    fn sid(&self) -> Option<String> {
        None
    }
}

/// Classify a value by the capabilities it exposes.
///
/// An effect wrapper may also expose the other capabilities, so the check
/// order is runnable, then readable, then triggerable.
pub fn classify<U: Unit + ?Sized>(value: &U) -> UnitKind {
    if value.as_runnable().is_some() {
        UnitKind::EffectWrapper
    } else if value.as_readable().is_some() {
        UnitKind::Store
    } else if value.as_triggerable().is_some() {
        UnitKind::Action
    } else {
        UnitKind::Unknown
    }
}

/// Shared, stampable stable identifier.
///
/// All clones of a unit share one `Sid`, so stamping through any handle is
/// visible through every other.
#[derive(Clone, Default)]
pub struct Sid(Arc<RwLock<Option<Arc<str>>>>);

impl Sid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier. A later stamp replaces an earlier one.
    pub fn stamp(&self, sid: &str) {
        *self.0.write() = Some(Arc::from(sid));
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().as_deref().map(str::to_owned)
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.read() {
            Some(sid) => write!(f, "{sid:?}"),
            None => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Unit for Plain {}

    struct Both;

    impl Triggerable for Both {
        fn trigger_count(&self) -> u64 {
            0
        }

        fn watcher_count(&self) -> usize {
            0
        }
    }

    impl Runnable for Both {
        fn run_count(&self) -> u64 {
            0
        }

        fn pending(&self) -> usize {
            0
        }
    }

    impl Unit for Both {
        fn as_triggerable(&self) -> Option<&dyn Triggerable> {
            Some(self)
        }

        fn as_runnable(&self) -> Option<&dyn Runnable> {
            Some(self)
        }
    }

    #[test]
    fn plain_value_is_unknown() {
        assert_eq!(classify(&Plain), UnitKind::Unknown);
        assert!(!UnitKind::Unknown.is_unit());
    }

    #[test]
    fn runnable_wins_over_triggerable() {
        assert_eq!(classify(&Both), UnitKind::EffectWrapper);
    }

    #[test]
    fn sid_is_shared_between_clones() {
        let sid = Sid::new();
        let clone = sid.clone();
        assert_eq!(sid.get(), None);

        clone.stamp("counter");
        assert_eq!(sid.get().as_deref(), Some("counter"));

        sid.stamp("");
        assert_eq!(clone.get().as_deref(), Some(""));
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&UnitKind::EffectWrapper).unwrap();
        assert_eq!(json, "\"effect_wrapper\"");
        assert_eq!(UnitKind::EffectWrapper.to_string(), "effect");
    }
}
