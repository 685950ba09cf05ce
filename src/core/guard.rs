/*!
 * RAII Resource Guards
 *
 * Scoped ownership of OS resources with guaranteed release.
 *
 * A guard owns exactly one resource. The resource is released either
 * explicitly through [`Guard::release`], which reports failures, or
 * implicitly on drop, which logs them. Release happens at most once.
 */

use std::time::Instant;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,

    #[error("Release failed: {0}")]
    ReleaseFailed(String),
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}

/// Core guard trait
pub trait Guard {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str {
        self.metadata().resource_type
    }

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Check if guard still holds its resource
    fn is_active(&self) -> bool;

    /// Manually release the resource
    ///
    /// Returns `Err(GuardError::AlreadyReleased)` on a second call
    fn release(&mut self) -> GuardResult<()>;
}
