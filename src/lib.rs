//! Host-side interop core for running a WebAssembly build of SQLite under wasmtime.
//!
//! See [`runtime`] for the moving parts. [`demo`] is a small client built on top of it.

pub mod cli;
pub mod demo;
pub mod runtime;
pub mod settings;

pub mod messages {
    pub mod display_messages;
    pub mod interop_errors;
    pub(crate) mod interop_logging;
}

pub use messages::interop_errors::{ErrorKind, InteropError};
pub use runtime::allocator::{Allocation, ScratchMark};
pub use runtime::loader::ModuleSource;
pub use runtime::strings::MarshalledString;
pub use runtime::trampoline::signature::{Signature, ValueKind};
pub use runtime::{HostFunc, HostState, ModuleHandle, Runtime};
pub use settings::RuntimeConfig;
