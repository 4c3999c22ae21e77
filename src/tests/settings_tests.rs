//! Tests for runtime config defaults and TOML parsing.

use super::{DEFAULT_MODULE_PATH, ExportNames, RuntimeConfig};
use crate::messages::interop_errors::ErrorKind;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn defaults_match_emscripten_export_names() {
    let config = RuntimeConfig::default();
    assert_eq!(config.module_path, PathBuf::from(DEFAULT_MODULE_PATH));
    assert_eq!(config.exports.malloc, "malloc");
    assert_eq!(config.exports.stack_save, "stackSave");
    assert_eq!(config.exports.table, "__indirect_function_table");
    assert_eq!(config.exports.ctors, "__wasm_call_ctors");
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let config = RuntimeConfig::from_toml_str(
        r#"
module_path = "build/sqlite3.wasm"

[exports]
malloc = "sqlite3_malloc"
"#,
    )
    .expect("config should parse");

    assert_eq!(config.module_path, PathBuf::from("build/sqlite3.wasm"));
    assert_eq!(config.exports.malloc, "sqlite3_malloc");
    assert_eq!(config.exports.free, ExportNames::default().free);
}

#[test]
fn empty_module_path_is_rejected() {
    let err = RuntimeConfig::from_toml_str("module_path = \"\"").expect_err("empty path fails");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = RuntimeConfig::from_toml_str("module_path = [").expect_err("bad toml fails");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "module_path = \"other.wasm\"").expect("write config");

    let config = RuntimeConfig::from_file(file.path()).expect("config file should load");
    assert_eq!(config.module_path, PathBuf::from("other.wasm"));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = RuntimeConfig::from_file(&dir.path().join("nope.toml"))
        .expect_err("missing file fails");
    assert_eq!(err.kind(), ErrorKind::Config);
}
