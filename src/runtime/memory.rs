// Linear memory access for the host side of the boundary
//
// Views borrow the store context, so a view can't be held across a call into the
// module (those need the store mutably). Every access re-acquires its view, which is
// what keeps us safe when the module grows its memory and the buffer moves.

use crate::messages::interop_errors::InteropError;
use crate::return_interop_error;
use crate::runtime::HostState;
use crate::settings::POINTER_SIZE;
use wasmtime::{AsContext, AsContextMut, Memory};

/// Handle to the module's linear memory.
///
/// Cheap to copy. It holds no view itself, only the wasmtime handle.
#[derive(Debug, Clone, Copy)]
pub struct LinearMemory {
    memory: Memory,
}

/// A little-endian 32-bit word view over linear memory
#[derive(Debug, Clone, Copy)]
pub struct WordView<'a> {
    bytes: &'a [u8],
}

impl<'a> WordView<'a> {
    /// Number of whole words in the view
    pub fn len(&self) -> usize {
        self.bytes.len() / POINTER_SIZE as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Word at `word_index`, i.e. the value at byte offset `word_index * 4`
    pub fn get(&self, word_index: usize) -> Option<u32> {
        let start = word_index.checked_mul(POINTER_SIZE as usize)?;
        let word = self.bytes.get(start..start + POINTER_SIZE as usize)?;
        Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
    }
}

impl LinearMemory {
    pub fn new(memory: Memory) -> Self {
        LinearMemory { memory }
    }

    pub fn raw(&self) -> Memory {
        self.memory
    }

    /// Current size of linear memory in bytes
    pub fn size(&self, store: &impl AsContext<Data = HostState>) -> usize {
        self.memory.data_size(store.as_context())
    }

    /// Fresh byte view over the current buffer
    pub fn byte_view<'a>(&self, store: &'a impl AsContext<Data = HostState>) -> &'a [u8] {
        self.memory.data(store.as_context())
    }

    /// Fresh 32-bit word view over the current buffer
    pub fn word_view<'a>(&self, store: &'a impl AsContext<Data = HostState>) -> WordView<'a> {
        WordView {
            bytes: self.byte_view(store),
        }
    }

    /// Read the 32-bit value stored at `ptr`.
    ///
    /// `ptr` must be 4-byte aligned, as it would be for a word view index.
    pub fn peek_pointer(
        &self,
        store: &impl AsContext<Data = HostState>,
        ptr: u32,
    ) -> Result<u32, InteropError> {
        if ptr % POINTER_SIZE != 0 {
            return_interop_error!(Memory, ptr, POINTER_SIZE, "pointer is not 4-byte aligned");
        }

        let words = self.word_view(store);
        match words.get((ptr / POINTER_SIZE) as usize) {
            Some(value) => Ok(value),
            None => return_interop_error!(
                Memory,
                ptr,
                POINTER_SIZE,
                "out of bounds, memory size is {}",
                self.size(store)
            ),
        }
    }

    /// Write a 32-bit value at `ptr` (must be 4-byte aligned)
    pub fn poke_pointer(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        ptr: u32,
        value: u32,
    ) -> Result<(), InteropError> {
        if ptr % POINTER_SIZE != 0 {
            return_interop_error!(Memory, ptr, POINTER_SIZE, "pointer is not 4-byte aligned");
        }

        self.write_bytes(&mut store, ptr, &value.to_le_bytes())
    }

    /// Copy `len` bytes starting at `ptr` out of linear memory
    pub fn read_bytes(
        &self,
        store: &impl AsContext<Data = HostState>,
        ptr: u32,
        len: u32,
    ) -> Result<Vec<u8>, InteropError> {
        let view = self.byte_view(store);
        let range = checked_range(ptr, len, view.len())?;
        Ok(view[range].to_vec())
    }

    pub fn write_bytes(
        &self,
        mut store: impl AsContextMut<Data = HostState>,
        ptr: u32,
        bytes: &[u8],
    ) -> Result<(), InteropError> {
        let len = match u32::try_from(bytes.len()) {
            Ok(len) => len,
            Err(_) => return_interop_error!(Memory, ptr, u32::MAX, "write larger than 4GiB"),
        };

        let view = self.memory.data_mut(store.as_context_mut());
        let range = checked_range(ptr, len, view.len())?;
        view[range].copy_from_slice(bytes);
        Ok(())
    }
}

fn checked_range(
    ptr: u32,
    len: u32,
    memory_size: usize,
) -> Result<std::ops::Range<usize>, InteropError> {
    let end = match ptr.checked_add(len) {
        Some(end) => end as usize,
        None => return_interop_error!(Memory, ptr, len, "range overflows the address space"),
    };

    if end > memory_size {
        return_interop_error!(
            Memory,
            ptr,
            len,
            "out of bounds, memory size is {}",
            memory_size
        );
    }

    Ok(ptr as usize..end)
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
