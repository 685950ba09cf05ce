/*!
 * Library Guard Tests
 * Load, resolve, invoke and release against the system C library
 */

use std::path::Path;
use std::sync::Arc;

use dyn_inspector::core::{Guard, GuardError};
use dyn_inspector::{InspectorError, LibraryGuard, LoaderStats};
use pretty_assertions::assert_eq;
use serial_test::serial;

/// `void endpwent(void)` matches the entry point signature and has no
/// observable effect when no passwd stream is open.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
const LIBC: &str = "libc.so.6";
#[cfg(all(target_os = "linux", target_env = "gnu"))]
const ENTRY: &str = "endpwent";

/// Shared library built from `tests/fixtures/entry_fixture.c`
#[cfg(all(target_os = "linux", target_env = "gnu"))]
const FIXTURE: &str = env!("DYN_INSPECTOR_FIXTURE");

/// Reads `foo_calls` through a handle of its own, which also keeps the
/// fixture mapped while guards come and go
#[cfg(all(target_os = "linux", target_env = "gnu"))]
struct FixtureCounter(libloading::Library);

#[cfg(all(target_os = "linux", target_env = "gnu"))]
impl FixtureCounter {
    fn open() -> Self {
        Self(unsafe { libloading::Library::new(FIXTURE) }.unwrap())
    }

    fn calls(&self) -> u32 {
        unsafe {
            let counter = self.0.get::<*const u32>(b"foo_calls").unwrap();
            std::ptr::read_volatile(*counter)
        }
    }
}

#[test]
fn test_open_missing_library() {
    let stats = Arc::new(LoaderStats::new());
    let path = Path::new("/nonexistent/dir/libfoo.so");

    let result = unsafe { LibraryGuard::open(path, stats.clone()) };
    match result {
        Err(InspectorError::LibraryLoad { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected LibraryLoad error, got {other:?}"),
    }

    let snap = stats.snapshot();
    assert_eq!(snap.load_failures, 1);
    assert_eq!(snap.loads, 0);
    assert_eq!(snap.resolutions + snap.resolution_failures, 0);
    assert_eq!(snap.releases, 0);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_resolve_invoke_close() {
    let stats = Arc::new(LoaderStats::new());
    let library = unsafe { LibraryGuard::open(Path::new(LIBC), stats.clone()) }.unwrap();
    assert!(library.is_active());
    assert_eq!(library.resource_type(), "library");

    {
        let entry = unsafe { library.resolve(ENTRY) }.unwrap();
        assert_eq!(entry.name(), ENTRY);
        assert_ne!(entry.address(), 0);
        entry.invoke();
    }
    library.close().unwrap();

    let snap = stats.snapshot();
    assert_eq!(snap.loads, 1);
    assert_eq!(snap.resolutions, 1);
    assert_eq!(snap.invocations, 1);
    assert_eq!(snap.releases, 1);
    assert_eq!(stats.open_libraries(), 0);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_missing_symbol_detected_by_loader() {
    let stats = Arc::new(LoaderStats::new());
    let library = unsafe { LibraryGuard::open(Path::new(LIBC), stats.clone()) }.unwrap();

    let result = unsafe { library.resolve("dyn_inspector_no_such_symbol") };
    match &result {
        Err(InspectorError::SymbolResolution { symbol, source, .. }) => {
            assert_eq!(symbol, "dyn_inspector_no_such_symbol");
            // dlerror text names the missing symbol
            assert!(source.to_string().contains("dyn_inspector_no_such_symbol"));
        }
        other => panic!("expected SymbolResolution error, got {other:?}"),
    }
    drop(result);

    assert_eq!(stats.snapshot().resolution_failures, 1);
    assert_eq!(stats.snapshot().invocations, 0);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_drop_releases_exactly_once() {
    let stats = Arc::new(LoaderStats::new());
    {
        let _library = unsafe { LibraryGuard::open(Path::new(LIBC), stats.clone()) }.unwrap();
        assert_eq!(stats.open_libraries(), 1);
    }
    assert_eq!(stats.snapshot().releases, 1);
    assert_eq!(stats.open_libraries(), 0);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_manual_release_then_resolve() {
    let stats = Arc::new(LoaderStats::new());
    let mut library = unsafe { LibraryGuard::open(Path::new(LIBC), stats.clone()) }.unwrap();

    library.release().unwrap();
    assert!(!library.is_active());
    assert!(matches!(library.release(), Err(GuardError::AlreadyReleased)));
    assert!(matches!(
        unsafe { library.resolve(ENTRY) },
        Err(InspectorError::LibraryReleased { .. })
    ));

    // Closing an already released guard is a no-op, and drop does not
    // release a second time
    library.close().unwrap();
    assert_eq!(stats.snapshot().releases, 1);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
#[serial]
fn test_fixture_entry_runs_exactly_once() {
    let counter = FixtureCounter::open();
    let before = counter.calls();
    let stats = Arc::new(LoaderStats::new());

    let library = unsafe { LibraryGuard::open(Path::new(FIXTURE), stats.clone()) }.unwrap();
    {
        let entry = unsafe { library.resolve("foo") }.unwrap();
        entry.invoke();
    }
    library.close().unwrap();

    assert_eq!(counter.calls() - before, 1);
    let snap = stats.snapshot();
    assert_eq!(snap.invocations, 1);
    assert_eq!(snap.releases, 1);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
#[serial]
fn test_null_symbol_is_never_invoked() {
    let counter = FixtureCounter::open();
    let before = counter.calls();
    let stats = Arc::new(LoaderStats::new());
    let library = unsafe { LibraryGuard::open(Path::new(FIXTURE), stats.clone()) }.unwrap();

    match unsafe { library.resolve("null_entry") } {
        Err(InspectorError::NullSymbol { symbol, library: failed }) => {
            assert_eq!(symbol, "null_entry");
            assert_eq!(failed, Path::new(FIXTURE));
        }
        other => panic!("expected NullSymbol error, got {other:?}"),
    }
    drop(library);

    assert_eq!(counter.calls(), before);
    let snap = stats.snapshot();
    assert_eq!(snap.resolution_failures, 1);
    assert_eq!(snap.resolutions, 0);
    assert_eq!(snap.invocations, 0);
    assert_eq!(snap.releases, 1);
}
