//! # Trampolines
//!
//! Host closures handed to the module as function pointers.
//!
//! The module calls callbacks through `call_indirect`, so a callback has to live in its
//! indirect-call table. A host function only gets there as a wasm function export, so
//! each installed closure gets its own tiny module that imports it and exports it again.
//! That export goes into a new table slot, and the slot index is the function pointer.
//!
//! Table slots are never reclaimed.

pub mod encode;
pub mod signature;

use crate::messages::interop_errors::InteropError;
use crate::runtime::trampoline::encode::encode_trampoline_module;
use crate::runtime::trampoline::signature::Signature;
use crate::runtime::{HostState, Runtime};
use crate::settings::TRAMPOLINE_FIELD;
use crate::trampoline_log;
use wasmtime::{Caller, Func, Instance, Module, Ref, Val};

impl Runtime {
    /// Install `host_fn` in the indirect-call table and return its index.
    ///
    /// `signature` uses the compact descriptor form, e.g. `"iii"` for `(i32, i32) -> i32`.
    /// Arguments arrive in `params` and results must be written into `results`; both
    /// already have the lengths the signature describes.
    pub fn install_function<F>(&mut self, signature: &str, host_fn: F) -> Result<u32, InteropError>
    where
        F: Fn(Caller<'_, HostState>, &[Val], &mut [Val]) -> wasmtime::Result<()>
            + Send
            + Sync
            + 'static,
    {
        let signature = Signature::parse(signature)?;
        self.install_with_signature(&signature, host_fn)
    }

    pub fn install_with_signature<F>(
        &mut self,
        signature: &Signature,
        host_fn: F,
    ) -> Result<u32, InteropError>
    where
        F: Fn(Caller<'_, HostState>, &[Val], &mut [Val]) -> wasmtime::Result<()>
            + Send
            + Sync
            + 'static,
    {
        let table = self.handle("install_function")?.table;

        let bytes = encode_trampoline_module(signature)?;
        let module = Module::new(&self.engine, &bytes)
            .map_err(|e| InteropError::platform("failed to compile trampoline module", e))?;

        let func = Func::new(&mut self.store, signature.func_type(&self.engine), host_fn);
        let instance = Instance::new(&mut self.store, &module, &[func.into()]).map_err(|e| {
            InteropError::link_failure(format!("trampoline for '{}'", signature), e)
        })?;

        let export = match instance.get_func(&mut self.store, TRAMPOLINE_FIELD) {
            Some(export) => export,
            None => return Err(InteropError::missing_export(TRAMPOLINE_FIELD, "function")),
        };

        // The slot before growth is the new entry
        let index = table
            .grow(&mut self.store, 1, Ref::Func(Some(export)))
            .map_err(|e| InteropError::platform("failed to grow the indirect-call table", e))?;

        let index = match u32::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                return Err(InteropError::platform(
                    "trampoline index does not fit in a 32-bit pointer",
                    wasmtime::Error::msg(format!("table index {}", index)),
                ));
            }
        };

        trampoline_log!(Green "Installed trampoline ", signature, " at table index ", index);
        Ok(index)
    }
}

#[cfg(test)]
#[path = "tests/trampoline_tests.rs"]
mod tests;
