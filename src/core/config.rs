/*!
 * Inspector Configuration
 *
 * Compiled-in defaults, optionally overridden by a JSON file and then by
 * environment variables.
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use crate::fs::Permissions;

/// File whose mode is changed by default
pub const DEFAULT_TARGET_PATH: &str = "/etc/passwd";

/// Library loaded by default
pub const DEFAULT_LIBRARY_PATH: &str = "/usr/lib/libfoo.so";

/// Entry point resolved by default
pub const DEFAULT_SYMBOL: &str = "foo";

/// Environment variable naming a JSON config file
pub const CONFIG_FILE_ENV: &str = "DYN_INSPECTOR_CONFIG";
pub const TARGET_ENV: &str = "DYN_INSPECTOR_TARGET";
pub const MODE_ENV: &str = "DYN_INSPECTOR_MODE";
pub const LIBRARY_ENV: &str = "DYN_INSPECTOR_LIBRARY";
pub const SYMBOL_ENV: &str = "DYN_INSPECTOR_SYMBOL";
pub const TRACE_MODULES_ENV: &str = "DYN_INSPECTOR_TRACE_MODULES";

/// Everything one inspector run needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectorConfig {
    /// File whose mode is changed
    pub target_path: PathBuf,

    /// Mode applied to `target_path` (default: 0o444)
    pub mode: Permissions,

    /// Library loaded at runtime
    pub library_path: PathBuf,

    /// Entry point resolved and invoked
    pub symbol: String,

    /// Snapshot mapped modules around load and release
    pub trace_modules: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            target_path: PathBuf::from(DEFAULT_TARGET_PATH),
            mode: Permissions::readonly(),
            library_path: PathBuf::from(DEFAULT_LIBRARY_PATH),
            symbol: DEFAULT_SYMBOL.to_string(),
            trace_modules: false,
        }
    }
}

/// Partial configuration as read from a JSON file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    target_path: Option<PathBuf>,
    mode: Option<Permissions>,
    library_path: Option<PathBuf>,
    symbol: Option<String>,
    trace_modules: Option<bool>,
}

impl InspectorConfig {
    /// Builder-style setters, mostly for tests and embedding
    pub fn with_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_path = path.into();
        self
    }

    pub fn with_mode(mut self, mode: Permissions) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_trace_modules(mut self, enabled: bool) -> Self {
        self.trace_modules = enabled;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Layering: defaults, then the file named by `DYN_INSPECTOR_CONFIG`,
    /// then individual variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(file) = lookup(CONFIG_FILE_ENV) {
            config.apply_file(Path::new(&file))?;
        }

        if let Some(target) = non_empty(lookup(TARGET_ENV), TARGET_ENV)? {
            config.target_path = PathBuf::from(target);
        }
        if let Some(mode) = lookup(MODE_ENV) {
            config.mode =
                Permissions::parse_octal(&mode).ok_or(ConfigError::InvalidMode(mode))?;
        }
        if let Some(library) = non_empty(lookup(LIBRARY_ENV), LIBRARY_ENV)? {
            config.library_path = PathBuf::from(library);
        }
        if let Some(symbol) = non_empty(lookup(SYMBOL_ENV), SYMBOL_ENV)? {
            config.symbol = symbol;
        }
        if let Some(flag) = lookup(TRACE_MODULES_ENV) {
            config.trace_modules = parse_flag(&flag).ok_or_else(|| ConfigError::InvalidValue {
                key: TRACE_MODULES_ENV,
                reason: format!("expected 1/0/true/false, got {flag:?}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Overlay the fields present in a JSON config file
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&contents)?;

        if let Some(target) = file.target_path {
            self.target_path = target;
        }
        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        if let Some(library) = file.library_path {
            self.library_path = library;
        }
        if let Some(symbol) = file.symbol {
            self.symbol = symbol;
        }
        if let Some(trace) = file.trace_modules {
            self.trace_modules = trace;
        }
        Ok(())
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "symbol",
                reason: "symbol name must not be empty".into(),
            });
        }
        if self.symbol.contains('\0') {
            return Err(ConfigError::InvalidValue {
                key: "symbol",
                reason: "symbol name must not contain NUL".into(),
            });
        }
        if self.library_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "library_path",
                reason: "library path must not be empty".into(),
            });
        }
        if self.target_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "target_path",
                reason: "target path must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>, key: &'static str) -> Result<Option<String>, ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue {
            key,
            reason: "value must not be empty".into(),
        }),
        other => Ok(other),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" => Some(true),
        "0" | "false" | "FALSE" | "no" => Some(false),
        _ => None,
    }
}
