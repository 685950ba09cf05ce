use std::env;
use std::path::PathBuf;

/// Fixture shared library for the loader tests, exported to them through
/// `DYN_INSPECTOR_FIXTURE`
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=tests/fixtures/entry_fixture.c");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_env = env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if target_os != "linux" || target_env != "gnu" {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let library = out_dir.join("libentry_fixture.so");

    let compiler = cc::Build::new()
        .pic(true)
        .cargo_metadata(false)
        .get_compiler();
    let status = compiler
        .to_command()
        .arg("-shared")
        .arg("-o")
        .arg(&library)
        .arg("tests/fixtures/entry_fixture.c")
        .status()
        .expect("failed to run the C compiler for the entry fixture");
    assert!(status.success(), "entry fixture failed to compile: {status}");

    println!("cargo:rustc-env=DYN_INSPECTOR_FIXTURE={}", library.display());
}
