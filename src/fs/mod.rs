/*!
 * Filesystem Operations
 * Permission bits and mode changes on host paths
 */

pub mod permissions;

pub use permissions::{change_mode, current_mode, is_privileged, PermissionStatus, Permissions};
