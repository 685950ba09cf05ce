/*!
 * Dynamic Loader
 *
 * Load a library, resolve a typed entry point, invoke it, release the
 * library. The library handle is a [`LibraryGuard`]: it is released exactly
 * once on every exit path, and entry points cannot outlive it.
 */

pub mod entry;
pub mod library;
pub mod modules;

pub use entry::{EntryFn, EntryPoint};
pub use library::LibraryGuard;
pub use modules::{ModuleEntry, ModuleTable};
