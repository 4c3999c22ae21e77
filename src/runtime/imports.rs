//! Host functions the module imports, grouped by namespace.
//!
//! A precompiled module declares far more imports than a host ever needs (the whole
//! filesystem syscall surface, most of WASI). Each namespace is an [`ImportShim`]:
//! names with a registered [`HostFunc`] resolve to it, and every other name resolves to a
//! stub that only fails if the module actually calls it. Linking therefore never fails
//! on a missing function import.

use crate::import_log;
use crate::messages::interop_errors::InteropError;
use crate::runtime::{HostFunc, HostState};
use crate::settings::{ENV_NAMESPACE, ENVIRON_GET, ENVIRON_SIZES_GET, WASI_NAMESPACE};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use wasmtime::{Caller, Val};

#[derive(Clone)]
pub struct ImportShim {
    label: String,
    target: FxHashMap<String, HostFunc>,
}

impl ImportShim {
    pub fn new(label: impl Into<String>, target: FxHashMap<String, HostFunc>) -> Self {
        ImportShim {
            label: label.into(),
            target,
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, FxHashMap::default())
    }

    pub fn with(mut self, name: impl Into<String>, func: HostFunc) -> Self {
        self.insert(name, func);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, func: HostFunc) {
        self.target.insert(name.into(), func);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contains(&self, name: &str) -> bool {
        self.target.contains_key(name)
    }

    /// The registered function for `name`, or a stub raising `Unimplemented` when called.
    pub fn resolve(&self, name: &str) -> HostFunc {
        match self.target.get(name) {
            Some(func) => Arc::clone(func),
            None => unimplemented_stub(&self.label, name),
        }
    }
}

fn unimplemented_stub(label: &str, name: &str) -> HostFunc {
    let label = label.to_owned();
    let name = name.to_owned();

    Arc::new(move |_caller: Caller<'_, HostState>, _params: &[Val], _results: &mut [Val]| {
        import_log!(Red "Unimplemented import called: ", Yellow label, ".", Yellow name);
        Err(InteropError::unimplemented(label.as_str(), name.as_str()).into_wasmtime())
    })
}

/// Every namespace the loader knows how to satisfy.
///
/// Lookups never fail: an unknown namespace behaves like an empty shim labelled with the
/// namespace name.
#[derive(Clone, Default)]
pub struct ImportNamespaces {
    shims: FxHashMap<String, ImportShim>,
}

impl ImportNamespaces {
    /// `env` with only stubs (`env.memory` is handled by the loader), and
    /// `wasi_snapshot_preview1` reporting an empty environment.
    pub fn with_defaults() -> Self {
        let mut namespaces = ImportNamespaces::default();

        namespaces.insert(ImportShim::empty(ENV_NAMESPACE));
        namespaces.insert(
            ImportShim::empty(WASI_NAMESPACE)
                .with(ENVIRON_SIZES_GET, Arc::new(environ_sizes_get))
                .with(ENVIRON_GET, Arc::new(environ_get)),
        );

        namespaces
    }

    pub fn insert(&mut self, shim: ImportShim) {
        self.shims.insert(shim.label.clone(), shim);
    }

    pub fn define(&mut self, namespace: &str, name: &str, func: HostFunc) {
        match self.shims.get_mut(namespace) {
            Some(shim) => shim.insert(name, func),
            None => {
                self.insert(ImportShim::empty(namespace).with(name, func));
            }
        }
    }

    pub fn get(&self, namespace: &str) -> Option<&ImportShim> {
        self.shims.get(namespace)
    }

    pub fn resolve(&self, namespace: &str, name: &str) -> HostFunc {
        match self.shims.get(namespace) {
            Some(shim) => shim.resolve(name),
            None => unimplemented_stub(namespace, name),
        }
    }
}

// environ_sizes_get(count_ptr, buf_size_ptr) -> errno
fn environ_sizes_get(
    mut caller: Caller<'_, HostState>,
    params: &[Val],
    results: &mut [Val],
) -> wasmtime::Result<()> {
    let memory = caller.data().memory().map_err(InteropError::into_wasmtime)?;

    for param in params.iter().take(2) {
        let ptr = param_pointer(param, ENVIRON_SIZES_GET)?;
        memory
            .poke_pointer(&mut caller, ptr, 0)
            .map_err(InteropError::into_wasmtime)?;
    }

    import_log!(Dark Magenta "environ_sizes_get: reporting an empty environment");
    write_errno(results, 0);
    Ok(())
}

// environ_get(environ_ptr, buf_ptr) -> errno. With zero entries there is nothing to write.
fn environ_get(
    _caller: Caller<'_, HostState>,
    _params: &[Val],
    results: &mut [Val],
) -> wasmtime::Result<()> {
    write_errno(results, 0);
    Ok(())
}

fn param_pointer(param: &Val, import: &str) -> wasmtime::Result<u32> {
    match param {
        Val::I32(ptr) => Ok(*ptr as u32),
        other => Err(wasmtime::Error::msg(format!(
            "{} expects i32 pointer arguments, got {:?}",
            import, other
        ))),
    }
}

fn write_errno(results: &mut [Val], errno: i32) {
    if let Some(result) = results.first_mut() {
        *result = Val::I32(errno);
    }
}

#[cfg(test)]
#[path = "tests/imports_tests.rs"]
mod tests;
