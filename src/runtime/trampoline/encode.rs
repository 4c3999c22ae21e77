//! Trampoline module encoding.
//!
//! The module is as small as a module can be while still turning an imported host
//! function into something the indirect-call table accepts: one type, one import of that
//! type, one export of the import. There is no code section.

use crate::messages::interop_errors::InteropError;
use crate::runtime::trampoline::signature::Signature;
use crate::settings::{TRAMPOLINE_FIELD, TRAMPOLINE_IMPORT_MODULE};
use wasm_encoder::{EntityType, ExportKind, ExportSection, ImportSection, Module, TypeSection};

/// Encode and validate the trampoline module for `signature`
pub fn encode_trampoline_module(signature: &Signature) -> Result<Vec<u8>, InteropError> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    types.ty().function(
        signature.params.iter().map(|kind| kind.encoder_type()),
        signature.results().iter().map(|kind| kind.encoder_type()),
    );
    module.section(&types);

    let mut imports = ImportSection::new();
    imports.import(
        TRAMPOLINE_IMPORT_MODULE,
        TRAMPOLINE_FIELD,
        EntityType::Function(0),
    );
    module.section(&imports);

    // Function index 0 is the import
    let mut exports = ExportSection::new();
    exports.export(TRAMPOLINE_FIELD, ExportKind::Func, 0);
    module.section(&exports);

    let bytes = module.finish();
    validate_trampoline_module(&bytes, signature)?;

    Ok(bytes)
}

fn validate_trampoline_module(bytes: &[u8], signature: &Signature) -> Result<(), InteropError> {
    match wasmparser::validate(bytes) {
        Ok(_) => Ok(()),
        Err(e) => Err(InteropError::invalid_signature(
            signature.to_string(),
            format!("encoded trampoline failed validation: {}", e),
        )),
    }
}

#[cfg(test)]
#[path = "tests/encode_tests.rs"]
mod tests;
