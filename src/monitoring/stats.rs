/*!
 * Lock-Free Loader Statistics
 * Atomic counters for every stage of the load/resolve/invoke/release cycle
 */

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic loader statistics
///
/// Shared through an `Arc` between the inspector and whoever observes it.
#[derive(Debug, Default)]
pub struct LoaderStats {
    loads: AtomicU64,
    load_failures: AtomicU64,
    resolutions: AtomicU64,
    resolution_failures: AtomicU64,
    invocations: AtomicU64,
    releases: AtomicU64,
}

impl LoaderStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            loads: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            resolutions: AtomicU64::new(0),
            resolution_failures: AtomicU64::new(0),
            invocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_loads(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_load_failures(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_resolutions(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_resolution_failures(&self) {
        self.resolution_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_releases(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Libraries currently held open
    pub fn open_libraries(&self) -> u64 {
        let loads = self.loads.load(Ordering::Relaxed);
        loads.saturating_sub(self.releases.load(Ordering::Relaxed))
    }

    /// Get a snapshot of current stats
    pub fn snapshot(&self) -> LoaderStatsSnapshot {
        LoaderStatsSnapshot {
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LoaderStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStatsSnapshot {
    pub loads: u64,
    pub load_failures: u64,
    pub resolutions: u64,
    pub resolution_failures: u64,
    pub invocations: u64,
    pub releases: u64,
}
