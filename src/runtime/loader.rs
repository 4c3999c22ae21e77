//! Compiling, linking and initializing the module.
//!
//! `Runtime::load` is the only way a `ModuleHandle` comes into existence. Until it
//! returns, every instance-dependent operation fails with `NotInitialized`.

use crate::messages::interop_errors::InteropError;
use crate::runtime::allocator::AllocatorBridge;
use crate::runtime::memory::LinearMemory;
use crate::runtime::{ModuleHandle, Runtime, lookup_typed_func};
use crate::settings::RuntimeConfig;
use crate::{loader_log, timer_log};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use wasmtime::{ExternType, Func, Linker, Memory, Module};

/// Where the module bytes come from
pub enum ModuleSource {
    /// The configured `module_path`
    Default,
    Path(PathBuf),
    Bytes(Vec<u8>),

    /// A response still being streamed in. Drained before compiling.
    Reader(Box<dyn Read>),
}

impl ModuleSource {
    fn into_bytes(self, config: &RuntimeConfig) -> Result<Vec<u8>, InteropError> {
        match self {
            ModuleSource::Default => read_module_file(&config.module_path),
            ModuleSource::Path(path) => read_module_file(&path),
            ModuleSource::Bytes(bytes) => Ok(bytes),
            ModuleSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                match reader.read_to_end(&mut bytes) {
                    Ok(_) => Ok(bytes),
                    Err(cause) => Err(InteropError::ModuleSource {
                        path: PathBuf::from("<reader>"),
                        cause,
                    }),
                }
            }
        }
    }
}

impl fmt::Debug for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Default => write!(f, "Default"),
            ModuleSource::Path(path) => write!(f, "Path({})", path.display()),
            ModuleSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ModuleSource::Reader(_) => write!(f, "Reader"),
        }
    }
}

impl From<Vec<u8>> for ModuleSource {
    fn from(bytes: Vec<u8>) -> Self {
        ModuleSource::Bytes(bytes)
    }
}

impl From<PathBuf> for ModuleSource {
    fn from(path: PathBuf) -> Self {
        ModuleSource::Path(path)
    }
}

impl From<&Path> for ModuleSource {
    fn from(path: &Path) -> Self {
        ModuleSource::Path(path.to_path_buf())
    }
}

fn read_module_file(path: &Path) -> Result<Vec<u8>, InteropError> {
    fs::read(path).map_err(|cause| InteropError::ModuleSource {
        path: path.to_path_buf(),
        cause,
    })
}

impl Runtime {
    /// Compile, link and initialize the module, making it the current instance.
    ///
    /// Calling this again builds a second, independent instance and replaces the first.
    /// Handles, pointers and trampoline indices from the old instance are meaningless
    /// afterwards. On failure the previous instance (if any) stays current.
    pub fn load(&mut self, source: ModuleSource) -> Result<&ModuleHandle, InteropError> {
        let _time = Instant::now();
        loader_log!(Dark Magenta "Loading module from ", #source);

        let bytes = source.into_bytes(&self.config)?;
        let module = Module::new(&self.engine, &bytes)
            .map_err(|e| InteropError::platform("failed to compile module", e))?;

        timer_log!(_time, "Module compiled in: ");

        // Host functions may read the new memory during constructors, so it's swapped in
        // before instantiation and put back if anything fails
        let previous_memory = self.store.data().memory;
        let handle = match self.link_and_initialize(&module) {
            Ok(handle) => handle,
            Err(e) => {
                self.store.data_mut().memory = previous_memory;
                return Err(e);
            }
        };

        if self.module.is_some() {
            loader_log!(Yellow "Module loaded again, replacing the current instance");
        }

        self.store.data_mut().module = Some(handle.clone());
        self.module = Some(handle);

        timer_log!(_time, "Module loaded in: ");
        self.module()
    }

    fn link_and_initialize(&mut self, module: &Module) -> Result<ModuleHandle, InteropError> {
        let mut linker = Linker::new(&self.engine);
        linker.allow_shadowing(true);

        let mut imported_memory = None;

        for import in module.imports() {
            let namespace = import.module();
            let name = import.name();

            match import.ty() {
                ExternType::Memory(memory_type) => {
                    let memory = Memory::new(&mut self.store, memory_type).map_err(|e| {
                        InteropError::platform(
                            format!("failed to create memory for {}.{}", namespace, name),
                            e,
                        )
                    })?;

                    linker
                        .define(&self.store, namespace, name, memory)
                        .map_err(|e| {
                            InteropError::link_failure(format!("{}.{}", namespace, name), e)
                        })?;

                    imported_memory = Some(LinearMemory::new(memory));
                }

                ExternType::Func(func_type) => {
                    let host_fn = self.imports.resolve(namespace, name);
                    let func = Func::new(&mut self.store, func_type, move |caller, params, results| {
                        host_fn(caller, params, results)
                    });

                    linker
                        .define(&self.store, namespace, name, func)
                        .map_err(|e| {
                            InteropError::link_failure(format!("{}.{}", namespace, name), e)
                        })?;
                }

                // Instantiation reports these as unsatisfied imports
                _ => {
                    loader_log!(Yellow "Leaving import unresolved: ", namespace, ".", name);
                }
            }
        }

        self.store.data_mut().memory = imported_memory;

        let instance = linker
            .instantiate(&mut self.store, module)
            .map_err(|e| InteropError::link_failure("instantiation rejected the imports", e))?;

        let exports = &self.config.exports;

        let memory = match imported_memory {
            Some(memory) => memory,
            None => match instance.get_memory(&mut self.store, &exports.memory) {
                Some(memory) => {
                    let memory = LinearMemory::new(memory);
                    self.store.data_mut().memory = Some(memory);
                    memory
                }
                None => return Err(InteropError::missing_export(&exports.memory, "memory")),
            },
        };

        let ctors = lookup_typed_func::<(), ()>(&mut self.store, &instance, &exports.ctors)?;
        ctors
            .call(&mut self.store, ())
            .map_err(|e| InteropError::platform("static constructors failed", e))?;

        loader_log!(Green "Static constructors ran");

        let allocator = AllocatorBridge::resolve(&mut self.store, &instance, exports)?;
        let table = match instance.get_table(&mut self.store, &exports.table) {
            Some(table) => table,
            None => return Err(InteropError::missing_export(&exports.table, "table")),
        };

        Ok(ModuleHandle {
            instance,
            memory,
            table,
            allocator,
        })
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
