//! # Runtime
//!
//! Host-side glue for a precompiled WebAssembly database engine, built on wasmtime.
//!
//! ```text
//! ModuleSource → Loader → ModuleHandle ─┬─ LinearMemory    (views, pointer peeks)
//!                  ↑                    ├─ AllocatorBridge (malloc/free/realloc, scratch stack)
//!             ImportNamespaces          ├─ strings         (C-string marshalling)
//!            (shims + stubs)            └─ trampoline      (host closures → table indices)
//! ```
//!
//! The [`Runtime`] owns the wasmtime `Store` and the current [`ModuleHandle`]. Nothing that
//! depends on the instance works before [`Runtime::load`] returns: those operations fail
//! with `NotInitialized` instead of racing the loader.
//!
//! ## Memory discipline
//!
//! Pointers are plain `u32` offsets and are never tracked. Whoever allocates frees. The
//! scoped helpers (`with_allocation`, `with_cstring`, `with_scratch`) release on every exit
//! path, and should be preferred over manual `allocate`/`deallocate` pairs.

pub mod allocator;
pub mod imports;
pub mod loader;
pub mod memory;
pub mod strings;
pub mod trampoline;

#[cfg(test)]
#[path = "tests/test_support.rs"]
pub(crate) mod test_support;

use crate::messages::interop_errors::InteropError;
use crate::runtime::allocator::AllocatorBridge;
use crate::runtime::imports::ImportNamespaces;
use crate::runtime::memory::LinearMemory;
use crate::settings::RuntimeConfig;
use std::fmt;
use std::sync::Arc;
use wasmtime::{
    AsContextMut, Caller, Engine, Instance, Store, Table, TypedFunc, Val, WasmParams,
    WasmResults,
};

/// A host function the module can call, either through an import or a trampoline.
///
/// Receives the wasmtime `Caller` so it can reach linear memory through
/// `caller.data().memory()`.
pub type HostFunc = Arc<
    dyn Fn(Caller<'_, HostState>, &[Val], &mut [Val]) -> wasmtime::Result<()>
        + Send
        + Sync
        + 'static,
>;

/// Data stored in the wasmtime `Store`, visible to host functions via their `Caller`
#[derive(Default)]
pub struct HostState {
    memory: Option<LinearMemory>,
    module: Option<ModuleHandle>,
}

impl HostState {
    pub fn memory(&self) -> Result<LinearMemory, InteropError> {
        self.memory
            .ok_or_else(|| InteropError::not_initialized("linear memory access"))
    }

    pub fn module(&self) -> Result<&ModuleHandle, InteropError> {
        self.module
            .as_ref()
            .ok_or_else(|| InteropError::not_initialized("module access from a host function"))
    }
}

/// Everything the core needs from a linked module instance.
///
/// All fields are wasmtime handles, so cloning is cheap. They are only meaningful
/// together with the store that created them.
#[derive(Clone)]
pub struct ModuleHandle {
    instance: Instance,
    memory: LinearMemory,
    table: Table,
    allocator: AllocatorBridge,
}

impl ModuleHandle {
    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn memory(&self) -> LinearMemory {
        self.memory
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn allocator(&self) -> &AllocatorBridge {
        &self.allocator
    }
}

// TypedFunc has no Debug impl, so the allocator is left out
impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("instance", &self.instance)
            .field("memory", &self.memory)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

pub struct Runtime {
    engine: Engine,
    store: Store<HostState>,
    config: RuntimeConfig,
    imports: ImportNamespaces,
    module: Option<ModuleHandle>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_engine(Engine::default(), config)
    }

    pub fn with_engine(engine: Engine, config: RuntimeConfig) -> Self {
        let store = Store::new(&engine, HostState::default());
        Runtime {
            engine,
            store,
            config,
            imports: ImportNamespaces::with_defaults(),
            module: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &Store<HostState> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<HostState> {
        &mut self.store
    }

    /// Provide a host function for `namespace.name` on the next load.
    /// Replaces any earlier definition, including the built-in stubs and overrides.
    pub fn define_import(&mut self, namespace: &str, name: &str, func: HostFunc) {
        self.imports.define(namespace, name, func);
    }

    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }

    /// The current instance, or `NotInitialized` if `load` hasn't completed
    pub fn module(&self) -> Result<&ModuleHandle, InteropError> {
        self.module
            .as_ref()
            .ok_or_else(|| InteropError::not_initialized("module"))
    }

    // Cloned so callers can keep using `self.store` mutably alongside it
    fn handle(&self, operation: &str) -> Result<ModuleHandle, InteropError> {
        match &self.module {
            Some(module) => Ok(module.clone()),
            None => Err(InteropError::not_initialized(operation)),
        }
    }

    pub fn memory(&self) -> Result<LinearMemory, InteropError> {
        Ok(self.handle("memory")?.memory)
    }

    pub fn byte_view(&self) -> Result<&[u8], InteropError> {
        let memory = self.handle("byte_view")?.memory;
        Ok(memory.byte_view(&self.store))
    }

    pub fn peek_pointer(&self, ptr: u32) -> Result<u32, InteropError> {
        let memory = self.handle("peek_pointer")?.memory;
        memory.peek_pointer(&self.store, ptr)
    }

    /// Call an export by name with untyped arguments
    pub fn call_export(&mut self, name: &str, args: &[Val]) -> Result<Vec<Val>, InteropError> {
        let instance = self.handle(name)?.instance;
        let func = instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| InteropError::missing_export(name, "function"))?;

        let result_count = func.ty(&self.store).results().len();
        let mut results = vec![Val::I32(0); result_count];
        func.call(&mut self.store, args, &mut results)
            .map_err(|e| InteropError::platform(format!("call to '{}' failed", name), e))?;

        Ok(results)
    }

    /// Look up an export with a static signature. Call it with `store_mut()`.
    pub fn typed_export<Params, Results>(
        &mut self,
        name: &str,
    ) -> Result<TypedFunc<Params, Results>, InteropError>
    where
        Params: WasmParams,
        Results: WasmResults,
    {
        let instance = self.handle(name)?.instance;
        lookup_typed_func(&mut self.store, &instance, name)
    }
}

/// A function export with a static signature. A wrong signature counts as missing.
pub(crate) fn lookup_typed_func<Params, Results>(
    mut store: impl AsContextMut<Data = HostState>,
    instance: &Instance,
    name: &str,
) -> Result<TypedFunc<Params, Results>, InteropError>
where
    Params: WasmParams,
    Results: WasmResults,
{
    let func = instance
        .get_func(&mut store, name)
        .ok_or_else(|| InteropError::missing_export(name, "function"))?;

    func.typed::<Params, Results>(&store)
        .map_err(|_| InteropError::missing_export(name, "function with the expected signature"))
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(RuntimeConfig::default())
    }
}
