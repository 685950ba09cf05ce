/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for inspector operations
pub type InspectorResult<T> = Result<T, InspectorError>;

/// Configuration errors, raised before any side effect runs
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid permission mode: {0}")]
    #[diagnostic(
        code(config::invalid_mode),
        help("Use an octal mode no larger than 7777, e.g. 444, 0444 or 0o444.")
    )]
    InvalidMode(String),

    #[error("Invalid value for {key}: {reason}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue { key: &'static str, reason: String },

    #[error("Failed to read config file {}", .path.display())]
    #[diagnostic(
        code(config::read_failed),
        help("Check that DYN_INSPECTOR_CONFIG names a readable file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file")]
    #[diagnostic(
        code(config::parse_failed),
        help("The config file must be a JSON object; every field is optional.")
    )]
    Parse(#[from] serde_json::Error),
}

/// Unified inspector error type
///
/// One variant per failing step, so callers can tell a load failure from a
/// resolution failure without inspecting messages.
#[derive(Error, Debug, Diagnostic)]
pub enum InspectorError {
    #[error("Failed to change mode of {} to 0o{mode:o}", .path.display())]
    #[diagnostic(
        code(fs::permission_change_failed),
        help("Changing the mode of a file you do not own requires privilege.")
    )]
    PermissionChange {
        path: PathBuf,
        mode: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load library {}", .path.display())]
    #[diagnostic(
        code(loader::load_failed),
        help("The library or one of its dependencies could not be found or mapped.")
    )]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Failed to resolve symbol `{symbol}` in {}", .library.display())]
    #[diagnostic(
        code(loader::symbol_not_found),
        help("Check the exported symbols of the library, e.g. with `nm -D`.")
    )]
    SymbolResolution {
        symbol: String,
        library: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol `{symbol}` in {} resolved to a null address", .library.display())]
    #[diagnostic(
        code(loader::null_symbol),
        help("The symbol is declared but not defined (e.g. an unresolved weak symbol).")
    )]
    NullSymbol { symbol: String, library: PathBuf },

    #[error("Failed to release library {}", .path.display())]
    #[diagnostic(code(loader::release_failed))]
    LibraryRelease {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Library {} has already been released", .path.display())]
    #[diagnostic(code(loader::released))]
    LibraryReleased { path: PathBuf },

    #[error("Console write failed: {0}")]
    #[diagnostic(code(inspector::console_failed))]
    Console(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl InspectorError {
    /// Short stable name of the failing step, used as a log field
    pub fn step(&self) -> &'static str {
        match self {
            InspectorError::PermissionChange { .. } => "chmod",
            InspectorError::LibraryLoad { .. } => "load",
            InspectorError::SymbolResolution { .. } | InspectorError::NullSymbol { .. } => {
                "resolve"
            }
            InspectorError::LibraryRelease { .. } | InspectorError::LibraryReleased { .. } => {
                "release"
            }
            InspectorError::Console(_) => "console",
            InspectorError::Config(_) => "config",
        }
    }
}
