/*!
 * Library Guard
 * Scoped ownership of a dynamically loaded library
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, error, info, warn};

use super::entry::{EntryFn, EntryPoint};
use crate::core::errors::{InspectorError, InspectorResult};
use crate::core::guard::{Guard, GuardError, GuardMetadata, GuardResult};
use crate::monitoring::LoaderStats;

/// A loaded library, released exactly once
///
/// Symbols resolved from the guard borrow it, so the borrow checker rejects
/// any attempt to release the library while an [`EntryPoint`] is alive.
#[derive(Debug)]
pub struct LibraryGuard {
    library: Option<Library>,
    path: PathBuf,
    metadata: GuardMetadata,
    stats: Arc<LoaderStats>,
}

impl LibraryGuard {
    /// Load the library at `path`
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisers, which execute arbitrary code
    /// in this process. The caller vouches for the library.
    pub unsafe fn open(path: &Path, stats: Arc<LoaderStats>) -> InspectorResult<Self> {
        debug!(library = %path.display(), "loading library");

        // SAFETY: forwarded to the caller.
        let library = unsafe { Library::new(path) }.map_err(|source| {
            stats.inc_load_failures();
            error!(library = %path.display(), error = %source, "library load failed");
            InspectorError::LibraryLoad {
                path: path.to_path_buf(),
                source,
            }
        })?;

        stats.inc_loads();
        info!(library = %path.display(), "library loaded");

        Ok(Self {
            library: Some(library),
            path: path.to_path_buf(),
            metadata: GuardMetadata::new("library"),
            stats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `symbol` as an entry point with the [`EntryFn`] signature
    ///
    /// Failure is detected through the loader's own error report (`dlerror`
    /// on Unix), not through the handle.
    ///
    /// # Safety
    ///
    /// The symbol must name a function taking no arguments and returning
    /// nothing, callable with the C ABI.
    pub unsafe fn resolve(&self, symbol: &str) -> InspectorResult<EntryPoint<'_>> {
        let library = self
            .library
            .as_ref()
            .ok_or_else(|| InspectorError::LibraryReleased {
                path: self.path.clone(),
            })?;

        // SAFETY: the signature is asserted by the caller; `Option` absorbs
        // a null address instead of producing an invalid function pointer.
        let raw = unsafe { library.get::<Option<EntryFn>>(symbol.as_bytes()) }.map_err(
            |source| {
                self.stats.inc_resolution_failures();
                error!(
                    library = %self.path.display(),
                    symbol = symbol,
                    error = %source,
                    "symbol resolution failed"
                );
                InspectorError::SymbolResolution {
                    symbol: symbol.to_string(),
                    library: self.path.clone(),
                    source,
                }
            },
        )?;

        let Some(function) = raw.lift_option() else {
            self.stats.inc_resolution_failures();
            error!(
                library = %self.path.display(),
                symbol = symbol,
                "symbol resolved to a null address"
            );
            return Err(InspectorError::NullSymbol {
                symbol: symbol.to_string(),
                library: self.path.clone(),
            });
        };

        self.stats.inc_resolutions();
        debug!(library = %self.path.display(), symbol = symbol, "symbol resolved");

        Ok(EntryPoint::new(symbol, function, &self.stats))
    }

    /// Release the library, reporting any unload failure
    pub fn close(mut self) -> InspectorResult<()> {
        self.unload().map_err(|source| InspectorError::LibraryRelease {
            path: self.path.clone(),
            source,
        })
    }

    fn unload(&mut self) -> Result<(), libloading::Error> {
        let Some(library) = self.library.take() else {
            return Ok(());
        };
        // dlclose consumes the handle whether or not it reports an error
        self.stats.inc_releases();
        let result = library.close();
        match &result {
            Ok(()) => info!(
                library = %self.path.display(),
                held_us = self.metadata.lifetime_micros(),
                "library released"
            ),
            Err(e) => warn!(library = %self.path.display(), error = %e, "library release failed"),
        }
        result
    }
}

impl Guard for LibraryGuard {
    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.library.is_some()
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.is_active() {
            return Err(GuardError::AlreadyReleased);
        }
        self.unload()
            .map_err(|e| GuardError::ReleaseFailed(e.to_string()))
    }
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        if self.is_active() {
            debug!(library = %self.path.display(), "releasing library on drop");
            let _ = self.unload();
        }
    }
}
