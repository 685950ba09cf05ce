/*!
 * Core Module
 * Configuration, error handling and resource guards
 */

pub mod config;
pub mod errors;
pub mod guard;

// Re-export for convenience
pub use config::InspectorConfig;
pub use errors::*;
pub use guard::{Guard, GuardError, GuardMetadata, GuardResult};
