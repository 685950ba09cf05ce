/*!
 * Permission Tests
 * Mode changes against real files in a temporary directory
 */

use dyn_inspector::{change_mode, current_mode, InspectorError, PermissionStatus, Permissions};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::TempDir;

#[cfg(unix)]
#[test]
fn test_change_mode_applies_requested_bits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.txt");
    std::fs::write(&path, b"root:x:0:0::/root:/bin/sh\n").unwrap();

    let result = change_mode(&path, Permissions::readonly());
    assert!(result.is_ok());
    assert_eq!(PermissionStatus::from_result(&result).code(), 0);
    assert_eq!(current_mode(&path).unwrap(), Permissions::new(0o444));

    // Owner can always change the mode back
    change_mode(&path, Permissions::new(0o640)).unwrap();
    assert_eq!(current_mode(&path).unwrap().mode, 0o640);
}

#[test]
fn test_change_mode_missing_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing");

    let result = change_mode(&path, Permissions::readonly());
    assert_eq!(PermissionStatus::from_result(&result), PermissionStatus::FAILED);

    match result {
        Err(InspectorError::PermissionChange {
            path: failed,
            mode,
            source,
        }) => {
            assert_eq!(failed, path);
            assert_eq!(mode, 0o444);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected PermissionChange error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_change_mode_on_directory() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();

    change_mode(&sub, Permissions::new(0o700)).unwrap();
    assert_eq!(current_mode(&sub).unwrap().mode, 0o700);
}

proptest! {
    #[test]
    fn prop_new_masks_to_valid_bits(mode in any::<u32>()) {
        let perms = Permissions::new(mode);
        prop_assert!(perms.mode <= 0o7777);
        prop_assert_eq!(perms.mode, mode & 0o7777);
    }

    #[test]
    fn prop_parse_octal_accepts_formatted_modes(mode in 0u32..=0o7777) {
        let plain = format!("{mode:o}");
        let prefixed = format!("0o{mode:o}");
        prop_assert_eq!(Permissions::parse_octal(&plain), Some(Permissions::new(mode)));
        prop_assert_eq!(Permissions::parse_octal(&prefixed), Some(Permissions::new(mode)));
    }
}
