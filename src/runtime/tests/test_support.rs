#![cfg(test)]

use crate::runtime::Runtime;
use crate::runtime::loader::ModuleSource;
use wasmtime::Val;

pub(crate) const FIXTURE_WAT: &str = include_str!("../../../tests/fixtures/interop_fixture.wat");

// Owns its memory and exports it, but has no allocator
pub(crate) const NO_ALLOCATOR_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (table (export "__indirect_function_table") 1 funcref)
  (func (export "__wasm_call_ctors")))
"#;

// Imports a global, which the loader never provides
pub(crate) const GLOBAL_IMPORT_WAT: &str = r#"
(module
  (import "env" "memory" (memory 1))
  (import "env" "__stack_pointer" (global i32)))
"#;

pub(crate) fn fixture_bytes() -> Vec<u8> {
    wat::parse_str(FIXTURE_WAT).expect("fixture should assemble")
}

pub(crate) fn wat_bytes(source: &str) -> Vec<u8> {
    wat::parse_str(source).expect("test module should assemble")
}

pub(crate) fn loaded_runtime() -> Runtime {
    let mut runtime = Runtime::default();
    runtime
        .load(ModuleSource::Bytes(fixture_bytes()))
        .expect("fixture should load");
    runtime
}

pub(crate) fn call_i32(runtime: &mut Runtime, name: &str, args: &[Val]) -> i32 {
    let results = runtime
        .call_export(name, args)
        .unwrap_or_else(|e| panic!("calling {} failed: {}", name, e));

    match results.as_slice() {
        [Val::I32(value)] => *value,
        other => panic!("{} returned {:?}, expected a single i32", name, other),
    }
}
