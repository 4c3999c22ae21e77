//! Forwarding layer over the module's own allocator and scratch stack.
//!
//! Heap memory comes from the module's `malloc`/`free`/`realloc`, so the host and the
//! module agree on ownership. Short-lived buffers (out-parameters mostly) come from the
//! scratch stack instead, which is released by restoring a [`ScratchMark`].

use crate::alloc_log;
use crate::messages::interop_errors::InteropError;
use crate::runtime::{HostState, Runtime, lookup_typed_func};
use crate::settings::ExportNames;
use wasmtime::{AsContextMut, Instance, TypedFunc};

#[derive(Clone)]
pub struct AllocatorBridge {
    malloc: TypedFunc<u32, u32>,
    free: TypedFunc<u32, ()>,
    realloc: TypedFunc<(u32, u32), u32>,
    stack_alloc: TypedFunc<u32, u32>,
    stack_save: TypedFunc<(), u32>,
    stack_restore: TypedFunc<u32, ()>,
}

/// Position of the scratch stack pointer at a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchMark(u32);

impl ScratchMark {
    pub fn offset(&self) -> u32 {
        self.0
    }
}

/// A heap block owned by the host. Nothing frees it implicitly.
#[must_use = "an Allocation leaks unless it is released"]
#[derive(Debug, PartialEq, Eq)]
pub struct Allocation {
    ptr: u32,
    size: u32,
}

impl Allocation {
    pub fn ptr(&self) -> u32 {
        self.ptr
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn release(self, runtime: &mut Runtime) -> Result<(), InteropError> {
        runtime.deallocate(self.ptr)
    }
}

impl AllocatorBridge {
    /// Look up the six allocator exports named in `names`
    pub fn resolve(
        mut store: impl AsContextMut<Data = HostState>,
        instance: &Instance,
        names: &ExportNames,
    ) -> Result<Self, InteropError> {
        Ok(AllocatorBridge {
            malloc: lookup_typed_func(&mut store, instance, &names.malloc)?,
            free: lookup_typed_func(&mut store, instance, &names.free)?,
            realloc: lookup_typed_func(&mut store, instance, &names.realloc)?,
            stack_alloc: lookup_typed_func(&mut store, instance, &names.stack_alloc)?,
            stack_save: lookup_typed_func(&mut store, instance, &names.stack_save)?,
            stack_restore: lookup_typed_func(&mut store, instance, &names.stack_restore)?,
        })
    }

    pub fn allocate(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        n: u32,
    ) -> Result<u32, InteropError> {
        let ptr = self
            .malloc
            .call(&mut store, n)
            .map_err(|e| InteropError::platform("malloc trapped", e))?;

        if ptr == 0 {
            alloc_log!(Red "malloc(", n, ") returned null");
            return Err(InteropError::allocation_failure("malloc", n));
        }

        alloc_log!(Dark Magenta "malloc(", n, ") -> ", ptr);
        Ok(ptr)
    }

    pub fn deallocate(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        ptr: u32,
    ) -> Result<(), InteropError> {
        alloc_log!(Dark Magenta "free(", ptr, ")");
        self.free
            .call(&mut store, ptr)
            .map_err(|e| InteropError::platform("free trapped", e))
    }

    /// Resize a heap block. Shrinking to zero returns null without touching `ptr`.
    pub fn reallocate(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        ptr: u32,
        n: u32,
    ) -> Result<u32, InteropError> {
        if n == 0 {
            return Ok(0);
        }

        let new_ptr = self
            .realloc
            .call(&mut store, (ptr, n))
            .map_err(|e| InteropError::platform("realloc trapped", e))?;

        if new_ptr == 0 {
            return Err(InteropError::allocation_failure("realloc", n));
        }

        alloc_log!(Dark Magenta "realloc(", ptr, ", ", n, ") -> ", new_ptr);
        Ok(new_ptr)
    }

    pub fn scratch_checkpoint(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
    ) -> Result<ScratchMark, InteropError> {
        let sp = self
            .stack_save
            .call(&mut store, ())
            .map_err(|e| InteropError::platform("stackSave trapped", e))?;

        Ok(ScratchMark(sp))
    }

    pub fn scratch_allocate(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        n: u32,
    ) -> Result<u32, InteropError> {
        self.stack_alloc
            .call(&mut store, n)
            .map_err(|e| InteropError::platform("stackAlloc trapped", e))
    }

    pub fn scratch_restore(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        mark: ScratchMark,
    ) -> Result<(), InteropError> {
        self.stack_restore
            .call(&mut store, mark.0)
            .map_err(|e| InteropError::platform("stackRestore trapped", e))
    }
}

impl Runtime {
    pub fn allocate(&mut self, n: u32) -> Result<u32, InteropError> {
        let allocator = self.handle("allocate")?.allocator;
        allocator.allocate(&mut self.store, n)
    }

    /// Like `allocate`, but returns an owned handle that must be released
    pub fn allocation(&mut self, n: u32) -> Result<Allocation, InteropError> {
        let ptr = self.allocate(n)?;
        Ok(Allocation { ptr, size: n })
    }

    pub fn deallocate(&mut self, ptr: u32) -> Result<(), InteropError> {
        let allocator = self.handle("deallocate")?.allocator;
        allocator.deallocate(&mut self.store, ptr)
    }

    pub fn reallocate(&mut self, ptr: u32, n: u32) -> Result<u32, InteropError> {
        let allocator = self.handle("reallocate")?.allocator;
        allocator.reallocate(&mut self.store, ptr, n)
    }

    pub fn scratch_checkpoint(&mut self) -> Result<ScratchMark, InteropError> {
        let allocator = self.handle("scratch_checkpoint")?.allocator;
        allocator.scratch_checkpoint(&mut self.store)
    }

    pub fn scratch_allocate(&mut self, n: u32) -> Result<u32, InteropError> {
        let allocator = self.handle("scratch_allocate")?.allocator;
        allocator.scratch_allocate(&mut self.store, n)
    }

    pub fn scratch_restore(&mut self, mark: ScratchMark) -> Result<(), InteropError> {
        let allocator = self.handle("scratch_restore")?.allocator;
        allocator.scratch_restore(&mut self.store, mark)
    }

    /// Run `f` with a scratch checkpoint, restoring it afterwards even if `f` fails.
    ///
    /// Every `scratch_allocate` made inside `f` is released on return. If both `f` and the
    /// restore fail, the error from `f` is returned.
    pub fn with_scratch<T>(
        &mut self,
        f: impl FnOnce(&mut Runtime) -> Result<T, InteropError>,
    ) -> Result<T, InteropError> {
        let mark = self.scratch_checkpoint()?;
        let result = f(self);
        let restored = self.scratch_restore(mark);

        let value = result?;
        restored?;
        Ok(value)
    }

    /// Run `f` with a fresh heap block of `n` bytes that is freed afterwards
    pub fn with_allocation<T>(
        &mut self,
        n: u32,
        f: impl FnOnce(&mut Runtime, &Allocation) -> Result<T, InteropError>,
    ) -> Result<T, InteropError> {
        let allocation = self.allocation(n)?;
        let result = f(self, &allocation);
        let released = allocation.release(self);

        let value = result?;
        released?;
        Ok(value)
    }
}

#[cfg(test)]
#[path = "tests/allocator_tests.rs"]
mod tests;
