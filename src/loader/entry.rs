/*!
 * Entry Points
 * Typed function references resolved from a loaded library
 */

use libloading::Symbol;
use std::fmt;
use tracing::info;

use crate::monitoring::LoaderStats;

/// Signature every entry point must have: no arguments, no return value
pub type EntryFn = unsafe extern "C" fn();

/// A resolved entry point, valid only while its library is loaded
///
/// The `'lib` lifetime ties the function reference to the
/// [`LibraryGuard`](super::LibraryGuard) it was resolved from.
pub struct EntryPoint<'lib> {
    name: String,
    function: Symbol<'lib, EntryFn>,
    stats: &'lib LoaderStats,
}

impl<'lib> EntryPoint<'lib> {
    pub(super) fn new(
        name: &str,
        function: Symbol<'lib, EntryFn>,
        stats: &'lib LoaderStats,
    ) -> Self {
        Self {
            name: name.to_string(),
            function,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the symbol resolved to
    pub fn address(&self) -> usize {
        *self.function as usize
    }

    /// Call the entry point once
    pub fn invoke(&self) {
        info!(
            symbol = %self.name,
            address = %format!("{:#x}", self.address()),
            "invoking entry point"
        );
        self.stats.inc_invocations();
        // SAFETY: `LibraryGuard::resolve` required the caller to vouch for the
        // `EntryFn` signature, and `'lib` keeps the library mapped.
        unsafe { (*self.function)() };
    }
}

impl fmt::Debug for EntryPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}
