/*!
 * Module Table
 * Shared objects currently mapped into this process
 */

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One mapped shared object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleEntry {
    pub path: PathBuf,
    /// Lowest address at which any segment of the object is mapped
    pub base: u64,
}

impl fmt::Display for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#014x} {}", self.base, self.path.display())
    }
}

/// Snapshot of mapped shared objects, in first-mapping order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleTable {
    entries: Vec<ModuleEntry>,
}

impl ModuleTable {
    /// Take a snapshot of the current process
    ///
    /// Returns an empty table on platforms without `/proc/self/maps`.
    pub fn snapshot() -> std::io::Result<Self> {
        #[cfg(target_os = "linux")]
        {
            let maps = std::fs::read_to_string("/proc/self/maps")?;
            Ok(Self::parse_maps(&maps))
        }

        #[cfg(not(target_os = "linux"))]
        {
            Ok(Self::default())
        }
    }

    /// Parse the contents of a `/proc/<pid>/maps` file
    ///
    /// Lines whose pathname is not a shared object are skipped, as are
    /// malformed lines.
    pub fn parse_maps(maps: &str) -> Self {
        let mut entries: Vec<ModuleEntry> = Vec::new();

        for line in maps.lines() {
            let Some((range, pathname)) = split_maps_line(line) else { continue };
            let path = Path::new(pathname);
            if !is_shared_object(path) {
                continue;
            }
            let Some(base) = range
                .split_once('-')
                .and_then(|(start, _)| u64::from_str_radix(start, 16).ok())
            else {
                continue;
            };

            match entries.iter_mut().find(|e| e.path == path) {
                Some(existing) => existing.base = existing.base.min(base),
                None => entries.push(ModuleEntry {
                    path: path.to_path_buf(),
                    base,
                }),
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Objects present in `self` but absent from `earlier`
    pub fn newly_mapped(&self, earlier: &ModuleTable) -> Vec<ModuleEntry> {
        self.entries
            .iter()
            .filter(|e| !earlier.contains(&e.path))
            .cloned()
            .collect()
    }

    /// Log every entry at debug level under the given stage label
    pub fn log(&self, stage: &str) {
        debug!(stage = stage, modules = self.len(), "module table");
        for entry in &self.entries {
            debug!(
                stage = stage,
                base = %format!("{:#x}", entry.base),
                path = %entry.path.display(),
                "module"
            );
        }
    }
}

/// Split a maps line into its address range and pathname
///
/// The pathname is everything after the inode column, so embedded spaces
/// survive. A ` (deleted)` marker for unlinked files is dropped.
fn split_maps_line(line: &str) -> Option<(&str, &str)> {
    // address perms offset dev inode pathname
    let mut rest = line;
    let mut range = "";
    for index in 0..5 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        if index == 0 {
            range = &rest[..end];
        }
        rest = &rest[end..];
    }
    let pathname = rest.trim_start();
    Some((range, pathname.strip_suffix(" (deleted)").unwrap_or(pathname)))
}

fn is_shared_object(path: &Path) -> bool {
    if !path.is_absolute() {
        return false;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".so") || name.contains(".so."))
}
