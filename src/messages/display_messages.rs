use crate::messages::interop_errors::{ErrorKind, InteropError};
use saying::say;
use std::error::Error;

pub fn print_interop_error(e: &InteropError) {
    match e.kind() {
        ErrorKind::NotInitialized => {
            say!(Yellow "Runtime not loaded yet - ", Dark Yellow "call load() before touching the module");
        }

        ErrorKind::AllocationFailure => {
            say!(Red "Allocation failed");
        }

        ErrorKind::Unimplemented => {
            say!("\n(ﾉ☉_⚆)ﾉ ", Red "Unimplemented import", " ╰(° O °)╯ ");
            say!(Dark Yellow "The module called a host function this runtime does not provide");
        }

        ErrorKind::LinkFailure => {
            say!(Red "Link failure");
        }

        ErrorKind::MemoryAccess => {
            say!(Red "Linear memory access fault");
        }

        ErrorKind::InvalidSignature => {
            say!(Red "Invalid trampoline signature");
        }

        ErrorKind::MissingExport => {
            say!(Yellow "Module is missing a required export");
        }

        ErrorKind::ModuleSource => {
            say!(Yellow "🏚 Can't read the module file");
        }

        ErrorKind::Config => {
            say!(Yellow "CONFIG FILE ISSUE - ");
            say!(Dark Yellow "Malformed runtime config, something doesn't make sense inside it");
        }

        ErrorKind::Platform => {
            say!(Red "wasmtime error");
        }
    }

    say!(Red { e.to_string() });

    // Walk the cause chain so platform errors keep their original message
    let mut source = e.source();
    while let Some(cause) = source {
        say!(Dark Magenta "  caused by: ", { cause.to_string() });
        source = cause.source();
    }
}
