/*!
 * Module Table Tests
 */

use std::path::PathBuf;

use dyn_inspector::ModuleTable;

#[test]
fn test_parse_skips_anonymous_and_special_mappings() {
    let maps = "\
7f0000000000-7f0000001000 rw-p 00000000 00:00 0
7f0000001000-7f0000002000 r--p 00000000 00:00 0 [vdso]
7f0000002000-7f0000003000 r-xp 00000000 fd:01 42 /opt/app/libplugin.so.1.2
7f0000003000-7f0000004000 r--p 00000000 fd:01 43 /opt/app/data.bin
";
    let table = ModuleTable::parse_maps(maps);
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.entries()[0].path,
        PathBuf::from("/opt/app/libplugin.so.1.2")
    );
    assert_eq!(
        table.entries()[0].to_string(),
        "0x7f0000002000 /opt/app/libplugin.so.1.2"
    );
}

#[test]
fn test_table_serializes() {
    let table =
        ModuleTable::parse_maps("7f0000002000-7f0000003000 r-xp 00000000 fd:01 42 /lib/libz.so.1\n");
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["entries"][0]["path"], "/lib/libz.so.1");
    assert_eq!(json["entries"][0]["base"], 0x7f0000002000u64);
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_snapshot_lists_libc() {
    let table = ModuleTable::snapshot().unwrap();
    assert!(table
        .entries()
        .iter()
        .any(|e| e.path.file_name().is_some_and(|n| n.to_string_lossy().starts_with("libc"))));
}
