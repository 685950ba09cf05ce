/*!
 * dyn-inspector Library
 *
 * Prints a greeting, changes the mode of a file, then loads a shared
 * library, resolves one typed entry point, invokes it and releases the
 * library. Every step reports its own result.
 */

pub mod core;
pub mod fs;
pub mod inspector;
pub mod loader;
pub mod monitoring;

// Re-exports
pub use crate::core::{ConfigError, InspectorConfig, InspectorError, InspectorResult};
pub use fs::{change_mode, current_mode, PermissionStatus, Permissions};
pub use inspector::{Inspector, InvocationSummary, RunReport, FAILURE_EXIT_STATUS, GREETING};
pub use loader::{EntryFn, EntryPoint, LibraryGuard, ModuleEntry, ModuleTable};
pub use monitoring::{init_tracing, LoaderStats, LoaderStatsSnapshot};
