//! Error types for the host/module boundary.
//!
//! Every failure in the core surfaces as an [`InteropError`]. Platform failures
//! (compilation, linking, traps, I/O) keep the original error as their `source()`.
//! Nothing here retries or recovers; callers decide what to do with a failed
//! allocation or a failed link.

use std::fmt::{self, Display};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An instance-dependent operation ran before `Runtime::load` completed
    NotInitialized,

    /// The module's allocator (or reallocator) returned the null pointer
    AllocationFailure,

    /// An import that was never implemented was actually invoked
    Unimplemented,

    /// Instantiation rejected the module's imports
    LinkFailure,

    /// Out-of-range or misaligned linear memory access
    MemoryAccess,

    /// A trampoline type descriptor could not be parsed or encoded
    InvalidSignature,

    /// A required export is absent or has the wrong type
    MissingExport,

    /// The module bytes could not be read
    ModuleSource,

    /// The runtime configuration could not be read or parsed
    Config,

    /// Anything else raised by wasmtime (compile errors, traps, table growth)
    Platform,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotInitialized => "not initialized",
            ErrorKind::AllocationFailure => "allocation failure",
            ErrorKind::Unimplemented => "unimplemented import",
            ErrorKind::LinkFailure => "link failure",
            ErrorKind::MemoryAccess => "memory access",
            ErrorKind::InvalidSignature => "invalid signature",
            ErrorKind::MissingExport => "missing export",
            ErrorKind::ModuleSource => "module source",
            ErrorKind::Config => "config",
            ErrorKind::Platform => "platform",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InteropError {
    #[error("module is not loaded yet, '{operation}' requires Runtime::load to complete first")]
    NotInitialized { operation: String },

    #[error("{operation} of {requested} bytes returned the null pointer")]
    AllocationFailure {
        operation: &'static str,
        requested: u32,
    },

    #[error("{label}: import '{name}' is not implemented")]
    Unimplemented { label: String, name: String },

    #[error("failed to link module: {context}")]
    LinkFailure {
        context: String,
        #[source]
        cause: wasmtime::Error,
    },

    #[error("memory access at {ptr} (len {len}) failed: {reason}")]
    MemoryAccess {
        ptr: u32,
        len: u32,
        reason: String,
    },

    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("module does not export {kind} '{name}'")]
    MissingExport { name: String, kind: &'static str },

    #[error("could not read module from {}", .path.display())]
    ModuleSource {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("invalid runtime config: {msg}")]
    Config { msg: String },

    #[error("{context}")]
    Platform {
        context: String,
        #[source]
        cause: wasmtime::Error,
    },
}

impl InteropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InteropError::NotInitialized { .. } => ErrorKind::NotInitialized,
            InteropError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            InteropError::Unimplemented { .. } => ErrorKind::Unimplemented,
            InteropError::LinkFailure { .. } => ErrorKind::LinkFailure,
            InteropError::MemoryAccess { .. } => ErrorKind::MemoryAccess,
            InteropError::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            InteropError::MissingExport { .. } => ErrorKind::MissingExport,
            InteropError::ModuleSource { .. } => ErrorKind::ModuleSource,
            InteropError::Config { .. } => ErrorKind::Config,
            InteropError::Platform { .. } => ErrorKind::Platform,
        }
    }

    pub fn not_initialized(operation: impl Into<String>) -> Self {
        InteropError::NotInitialized {
            operation: operation.into(),
        }
    }

    pub fn allocation_failure(operation: &'static str, requested: u32) -> Self {
        InteropError::AllocationFailure {
            operation,
            requested,
        }
    }

    pub fn unimplemented(label: impl Into<String>, name: impl Into<String>) -> Self {
        InteropError::Unimplemented {
            label: label.into(),
            name: name.into(),
        }
    }

    pub fn link_failure(context: impl Into<String>, cause: wasmtime::Error) -> Self {
        InteropError::LinkFailure {
            context: context.into(),
            cause,
        }
    }

    pub fn memory_access(ptr: u32, len: u32, reason: impl Into<String>) -> Self {
        InteropError::MemoryAccess {
            ptr,
            len,
            reason: reason.into(),
        }
    }

    pub fn invalid_signature(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        InteropError::InvalidSignature {
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_export(name: impl Into<String>, kind: &'static str) -> Self {
        InteropError::MissingExport {
            name: name.into(),
            kind,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        InteropError::Config { msg: msg.into() }
    }

    /// Wrap a wasmtime error raised while doing `context`.
    ///
    /// Errors that started life as an `InteropError` (an unimplemented stub or a host
    /// callback failing inside a call) are unwrapped instead of being nested, so the
    /// original kind survives the round trip through the module.
    pub fn platform(context: impl Into<String>, cause: wasmtime::Error) -> Self {
        match cause.downcast::<InteropError>() {
            Ok(original) => original,
            Err(cause) => InteropError::Platform {
                context: context.into(),
                cause,
            },
        }
    }

    /// Convert into the error type host functions must return to wasmtime.
    pub fn into_wasmtime(self) -> wasmtime::Error {
        wasmtime::Error::new(self)
    }
}

/// Return early with one of the message-carrying `InteropError` kinds.
#[macro_export]
macro_rules! return_interop_error {
    (Signature, $signature:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        return Err($crate::messages::interop_errors::InteropError::invalid_signature(
            $signature,
            format!($fmt $(, $arg)*),
        ));
    }};
    (Memory, $ptr:expr, $len:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        return Err($crate::messages::interop_errors::InteropError::memory_access(
            $ptr,
            $len,
            format!($fmt $(, $arg)*),
        ));
    }};
    (Config, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        return Err($crate::messages::interop_errors::InteropError::config(
            format!($fmt $(, $arg)*),
        ));
    }};
}
