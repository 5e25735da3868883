//! Error types for the registrar and the context accessor.

use thiserror::Error;

/// Boxed error carried through from caller-supplied factories, hooks and
/// effect handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for registrar operations.
pub type Result<T, E = RegistrarError> = std::result::Result<T, E>;

/// Errors raised by the context accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The operation requires an active execution context.
    #[error("no active execution context")]
    NoActiveContext,

    /// A key was read back with a type other than the one it was stored with.
    #[error("context key `{key}` holds a value of a different type")]
    KeyTypeMismatch { key: &'static str },
}

/// Errors raised by getters and registry maintenance.
#[derive(Error, Debug)]
pub enum RegistrarError {
    /// Context lookup failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The factory failed; the slot was left empty.
    #[error("factory for `{label}` failed: {source}")]
    Factory {
        label: String,
        #[source]
        source: BoxError,
    },

    /// A creation hook failed; the unit stays cached.
    #[error("creation hook for `{label}` failed: {source}")]
    Hook {
        label: String,
        #[source]
        source: BoxError,
    },

    /// The getter was called again from inside its own factory.
    #[error("getter `{label}` re-entered while its unit was being created")]
    Reentrant { label: String },

    /// The cached value could not be read back as the getter's type.
    #[error("cached value for `{label}` has an unexpected type")]
    SlotTypeMismatch { label: String },
}

impl RegistrarError {
    /// True when the error means no context was active.
    pub fn is_no_active_context(&self) -> bool {
        matches!(self, Self::Context(ContextError::NoActiveContext))
    }
}
