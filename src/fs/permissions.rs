/*!
 * File Permissions
 * Unix-style permission bits and the mode-change operation
 */

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::core::errors::{InspectorError, InspectorResult};

/// File permissions (Unix-style) with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions {
    #[serde(deserialize_with = "deserialize_permission_mode")]
    pub mode: u32,
}

impl Permissions {
    /// Create permissions with mode validation (masks to valid bits)
    #[inline]
    #[must_use]
    pub const fn new(mode: u32) -> Self {
        Self {
            mode: mode & 0o7777,
        }
    }

    /// Create read-only permissions (0o444)
    #[inline]
    #[must_use]
    pub const fn readonly() -> Self {
        Self { mode: 0o444 }
    }

    /// Create read-write permissions (0o644)
    #[inline]
    #[must_use]
    pub const fn readwrite() -> Self {
        Self { mode: 0o644 }
    }

    /// Parse an octal mode string: `444`, `0444` or `0o444`
    ///
    /// Unlike [`Permissions::new`], out-of-range modes are rejected rather
    /// than masked.
    pub fn parse_octal(input: &str) -> Option<Self> {
        let digits = input.trim();
        let digits = digits
            .strip_prefix("0o")
            .or_else(|| digits.strip_prefix("0O"))
            .unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return None;
        }
        let mode = u32::from_str_radix(digits, 8).ok()?;
        (mode <= 0o7777).then_some(Self { mode })
    }

    /// Check if permissions are read-only (no write bits set)
    #[inline(always)]
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.mode & 0o222 == 0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:03o}", self.mode)
    }
}

/// Deserialize and validate permission mode (must be <= 0o7777)
fn deserialize_permission_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let mode = u32::deserialize(deserializer)?;
    if mode > 0o7777 {
        return Err(serde::de::Error::custom(format!(
            "invalid permission mode: 0o{:o} exceeds maximum 0o7777",
            mode
        )));
    }
    Ok(mode)
}

impl Default for Permissions {
    fn default() -> Self {
        Self::readonly()
    }
}

/// Numeric status of a mode change, printed to the console
///
/// `0` on success and `-1` on failure, matching the `chmod(2)` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus(i32);

impl PermissionStatus {
    pub const OK: Self = Self(0);
    pub const FAILED: Self = Self(-1);

    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Self::OK
        } else {
            Self::FAILED
        }
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set the mode bits of `path` to `perms`
///
/// Follows symlinks, like `chmod(2)`. On non-Unix hosts only the read-only
/// flag can be expressed, so the other bits are ignored there.
pub fn change_mode(path: &Path, perms: Permissions) -> InspectorResult<()> {
    debug!(
        path = %path.display(),
        mode = %perms,
        privileged = is_privileged(),
        "changing file mode"
    );

    set_mode(path, perms).map_err(|source| {
        warn!(
            path = %path.display(),
            mode = %perms,
            error = %source,
            "mode change failed"
        );
        InspectorError::PermissionChange {
            path: path.to_path_buf(),
            mode: perms.mode,
            source,
        }
    })
}

/// Read back the permission bits of `path`
pub fn current_mode(path: &Path) -> std::io::Result<Permissions> {
    let md = fs::metadata(path)?;

    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        md.permissions().mode()
    };
    #[cfg(not(unix))]
    let mode = if md.permissions().readonly() {
        0o444
    } else {
        0o644
    };

    Ok(Permissions::new(mode))
}

#[cfg(unix)]
fn set_mode(path: &Path, perms: Permissions) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(perms.mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, perms: Permissions) -> std::io::Result<()> {
    let mut std_perms = fs::metadata(path)?.permissions();
    std_perms.set_readonly(perms.is_readonly());
    fs::set_permissions(path, std_perms)
}

/// Whether the process runs with an effective uid of root
#[cfg(unix)]
pub fn is_privileged() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
pub fn is_privileged() -> bool {
    false
}
