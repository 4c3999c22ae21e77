//! Tests for demo CLI argument parsing.

use super::{Command, get_command, load_config};
use crate::messages::interop_errors::ErrorKind;
use std::path::{Path, PathBuf};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn no_arguments_runs_with_defaults() {
    let command = get_command(&args(&[])).expect("command should parse");
    assert_eq!(
        command,
        Command::Run {
            module: None,
            config: None
        }
    );
}

#[test]
fn module_and_config_in_any_order() {
    let expected = Command::Run {
        module: Some(PathBuf::from("build/sqlite3.wasm")),
        config: Some(PathBuf::from("runtime.toml")),
    };

    let command = get_command(&args(&["build/sqlite3.wasm", "--config", "runtime.toml"]));
    assert_eq!(command.unwrap(), expected);

    let command = get_command(&args(&["--config", "runtime.toml", "build/sqlite3.wasm"]));
    assert_eq!(command.unwrap(), expected);
}

#[test]
fn help_wins() {
    assert_eq!(get_command(&args(&["x.wasm", "--help"])).unwrap(), Command::Help);
    assert_eq!(get_command(&args(&["help"])).unwrap(), Command::Help);
}

#[test]
fn bad_arguments_are_rejected() {
    assert!(get_command(&args(&["--config"])).is_err());
    assert!(get_command(&args(&["--config", "--help"])).is_err());
    assert!(get_command(&args(&["--verbose"])).is_err());
    assert!(get_command(&args(&["a.wasm", "b.wasm"])).is_err());
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_config(Some(&dir.path().join("missing.toml"))).expect_err("missing config");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn explicit_config_is_read() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("runtime.toml");
    std::fs::write(&path, "module_path = \"elsewhere.wasm\"\n").expect("write config");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.module_path, Path::new("elsewhere.wasm"));
}
