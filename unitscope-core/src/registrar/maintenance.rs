//! Registry maintenance: clearing and introspection.

use tracing::debug;

use super::slot::REGISTRY_KEY;
use super::unit_ref::{UnitRecord, UnitRef};
use crate::context::ExecutionContext;
use crate::error::Result;

/// Forget every cached unit in the active context.
///
/// Later getter calls run their factories again. Units handed out before
/// the clean are not touched: they keep their state and their
/// subscriptions.
pub fn clean() -> Result<()> {
    let context = ExecutionContext::current()?;

    if let Some(registry) = context.read(&REGISTRY_KEY)? {
        let dropped = registry.clean();
        debug!(context = %context.id(), dropped, "cleaned unit registry");
    }

    Ok(())
}

/// Units created in the active context since it started or since the last
/// [`clean`], in creation order.
///
/// The returned vector is a copy; later creations do not appear in it.
pub fn expose() -> Result<Vec<UnitRef>> {
    let context = ExecutionContext::current()?;

    Ok(context
        .read(&REGISTRY_KEY)?
        .map(|registry| registry.snapshot())
        .unwrap_or_default())
}

/// Serializable form of [`expose`].
pub fn describe() -> Result<Vec<UnitRecord>> {
    Ok(expose()?.iter().map(UnitRef::record).collect())
}
