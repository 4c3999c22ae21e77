// NUL-terminated strings in linear memory
//
// Encoding is UTF-8 in both directions. Truncation counts bytes, not characters, so a
// byte budget can end in the middle of a codepoint. Decoding is lossy for that reason.

use crate::messages::interop_errors::InteropError;
use crate::{alloc_log, return_interop_error};
use crate::runtime::memory::LinearMemory;
use crate::runtime::{HostState, Runtime};
use wasmtime::AsContext;

/// A string written into linear memory. `len` excludes the terminator at `ptr + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarshalledString {
    pub ptr: u32,
    pub len: u32,
}

/// The stored form of `text`: at most `max_bytes` bytes (when positive) plus a zero byte
pub fn encode_cstring(text: &str, max_bytes: Option<u32>) -> Vec<u8> {
    let bytes = text.as_bytes();
    let kept = match max_bytes {
        Some(limit) if limit > 0 => bytes.len().min(limit as usize),
        _ => bytes.len(),
    };

    let mut encoded = Vec::with_capacity(kept + 1);
    encoded.extend_from_slice(&bytes[..kept]);
    encoded.push(0);
    encoded
}

/// Decode the NUL-terminated string at `ptr`.
///
/// Works from a `Caller` inside host callbacks as well as from the `Runtime`'s store.
pub fn read_cstring(
    memory: LinearMemory,
    store: &impl AsContext<Data = HostState>,
    ptr: u32,
) -> Result<String, InteropError> {
    let view = memory.byte_view(store);

    let tail = match view.get(ptr as usize..) {
        Some(tail) => tail,
        None => return_interop_error!(
            Memory,
            ptr,
            1,
            "string start is past the end of memory ({} bytes)",
            view.len()
        ),
    };

    match tail.iter().position(|byte| *byte == 0) {
        Some(len) => Ok(String::from_utf8_lossy(&tail[..len]).into_owned()),
        None => return_interop_error!(
            Memory,
            ptr,
            tail.len() as u32,
            "no terminator before the end of memory"
        ),
    }
}

/// `read_cstring`, with the null pointer read as `None` (SQL `NULL` columns)
pub fn read_cstring_opt(
    memory: LinearMemory,
    store: &impl AsContext<Data = HostState>,
    ptr: u32,
) -> Result<Option<String>, InteropError> {
    if ptr == 0 {
        return Ok(None);
    }

    read_cstring(memory, store, ptr).map(Some)
}

impl Runtime {
    /// Write `text` as a C string.
    ///
    /// Without a `target`, a block of `len + 1` bytes is taken from the module's allocator
    /// and the caller owns it. With one, the caller guarantees the space.
    pub fn alloc_string(
        &mut self,
        text: &str,
        target: Option<u32>,
        max_bytes: Option<u32>,
    ) -> Result<MarshalledString, InteropError> {
        let module = self.handle("alloc_string")?;
        let encoded = encode_cstring(text, max_bytes);

        // Terminator excluded
        let len = match u32::try_from(encoded.len() - 1) {
            Ok(len) if len < u32::MAX => len,
            _ => return_interop_error!(Memory, 0, u32::MAX, "string longer than linear memory"),
        };

        let ptr = match target {
            Some(ptr) => ptr,
            None => {
                let ptr = module.allocator.allocate(&mut self.store, len + 1)?;
                if let Err(e) = module.memory.write_bytes(&mut self.store, ptr, &encoded) {
                    // The write error is the one worth reporting
                    if module.allocator.deallocate(&mut self.store, ptr).is_err() {
                        alloc_log!(Red "free(", ptr, ") failed after a bad string write");
                    }
                    return Err(e);
                }

                return Ok(MarshalledString { ptr, len });
            }
        };

        module.memory.write_bytes(&mut self.store, ptr, &encoded)?;
        Ok(MarshalledString { ptr, len })
    }

    pub fn read_cstring(&self, ptr: u32) -> Result<String, InteropError> {
        let memory = self.handle("read_cstring")?.memory;
        read_cstring(memory, &self.store, ptr)
    }

    pub fn read_cstring_opt(&self, ptr: u32) -> Result<Option<String>, InteropError> {
        let memory = self.handle("read_cstring_opt")?.memory;
        read_cstring_opt(memory, &self.store, ptr)
    }

    /// Run `f` with `text` marshalled into a heap block that is freed afterwards
    pub fn with_cstring<T>(
        &mut self,
        text: &str,
        f: impl FnOnce(&mut Runtime, MarshalledString) -> Result<T, InteropError>,
    ) -> Result<T, InteropError> {
        let string = self.alloc_string(text, None, None)?;
        let result = f(self, string);
        let released = self.deallocate(string.ptr);

        let value = result?;
        released?;
        Ok(value)
    }
}

/// Format a string straight into a freshly allocated C string.
///
/// `alloc_cstr!(runtime, "PRAGMA {}", pragma)` is `runtime.alloc_string(&format!(..), None, None)`.
#[macro_export]
macro_rules! alloc_cstr {
    ($runtime:expr, $($arg:tt)*) => {
        $runtime.alloc_string(&format!($($arg)*), None, None)
    };
}

#[cfg(test)]
#[path = "tests/strings_tests.rs"]
mod tests;
