use crate::messages::interop_errors::InteropError;
use crate::return_interop_error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODULE_PATH: &str = "sqlite3.wasm";
pub const CONFIG_FILE_NAME: &str = "sqlwasm.toml";

// Import namespaces the module expects at link time
pub const ENV_NAMESPACE: &str = "env";
pub const WASI_NAMESPACE: &str = "wasi_snapshot_preview1";

// Startup environment queries answered with an empty environment
pub const ENVIRON_SIZES_GET: &str = "environ_sizes_get";
pub const ENVIRON_GET: &str = "environ_get";

// The single import/export pair of a synthesized trampoline module
pub const TRAMPOLINE_IMPORT_MODULE: &str = "trampoline";
pub const TRAMPOLINE_FIELD: &str = "host";

pub const WASM_PAGE_SIZE: usize = 65536;
pub const POINTER_SIZE: u32 = 4;

/// Names of the exports the core consumes.
///
/// Emscripten builds of SQLite use these names by default, other toolchains can
/// override them from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportNames {
    pub ctors: String,
    pub malloc: String,
    pub free: String,
    pub realloc: String,
    pub stack_alloc: String,
    pub stack_save: String,
    pub stack_restore: String,
    pub table: String,
    pub memory: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        ExportNames {
            ctors: String::from("__wasm_call_ctors"),
            malloc: String::from("malloc"),
            free: String::from("free"),
            realloc: String::from("realloc"),
            stack_alloc: String::from("stackAlloc"),
            stack_save: String::from("stackSave"),
            stack_restore: String::from("stackRestore"),
            table: String::from("__indirect_function_table"),
            memory: String::from("memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Where `ModuleSource::Default` reads the module from
    pub module_path: PathBuf,
    pub exports: ExportNames,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            module_path: PathBuf::from(DEFAULT_MODULE_PATH),
            exports: ExportNames::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        RuntimeConfig {
            module_path: module_path.into(),
            ..RuntimeConfig::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, InteropError> {
        let config: RuntimeConfig = match toml::from_str(source) {
            Ok(config) => config,
            Err(e) => return_interop_error!(Config, "{}", e),
        };

        if config.module_path.as_os_str().is_empty() {
            return_interop_error!(Config, "module_path must not be empty");
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, InteropError> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => return_interop_error!(Config, "can't read {}: {}", path.display(), e),
        };

        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
