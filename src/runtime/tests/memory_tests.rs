//! Tests for linear memory views and pointer access.

use crate::messages::interop_errors::ErrorKind;
use crate::runtime::test_support::{call_i32, loaded_runtime};
use crate::settings::WASM_PAGE_SIZE;
use wasmtime::Val;

#[test]
fn peek_pointer_reads_little_endian_words() {
    let mut runtime = loaded_runtime();
    let memory = runtime.memory().expect("memory after load");

    memory
        .write_bytes(runtime.store_mut(), 64, &[0x78, 0x56, 0x34, 0x12])
        .expect("write in bounds");

    assert_eq!(memory.peek_pointer(runtime.store(), 64).unwrap(), 0x1234_5678);
    assert_eq!(
        memory.word_view(runtime.store()).get(16),
        Some(0x1234_5678),
        "word index 16 is byte offset 64"
    );
}

#[test]
fn poke_then_peek() {
    let mut runtime = loaded_runtime();
    let memory = runtime.memory().unwrap();

    memory.poke_pointer(runtime.store_mut(), 128, 70_000).unwrap();
    assert_eq!(runtime.peek_pointer(128).unwrap(), 70_000);
}

#[test]
fn misaligned_peek_is_a_memory_access_error() {
    let runtime = loaded_runtime();
    let err = runtime.peek_pointer(65).expect_err("misaligned read fails");
    assert_eq!(err.kind(), ErrorKind::MemoryAccess);
}

#[test]
fn out_of_bounds_access_is_a_memory_access_error() {
    let mut runtime = loaded_runtime();
    let memory = runtime.memory().unwrap();
    let size = memory.size(runtime.store()) as u32;

    let err = memory.peek_pointer(runtime.store(), size).expect_err("past the end");
    assert_eq!(err.kind(), ErrorKind::MemoryAccess);

    let err = memory
        .write_bytes(runtime.store_mut(), size - 2, &[1, 2, 3])
        .expect_err("write straddling the end");
    assert_eq!(err.kind(), ErrorKind::MemoryAccess);

    let err = memory
        .read_bytes(runtime.store(), u32::MAX, 2)
        .expect_err("overflowing range");
    assert_eq!(err.kind(), ErrorKind::MemoryAccess);
}

#[test]
fn views_see_memory_growth() {
    let mut runtime = loaded_runtime();
    let before = runtime.byte_view().unwrap().len();
    assert_eq!(before, 2 * WASM_PAGE_SIZE);

    let previous_pages = call_i32(&mut runtime, "grow_memory", &[Val::I32(1)]);
    assert_eq!(previous_pages, 2);

    let memory = runtime.memory().unwrap();
    assert_eq!(memory.byte_view(runtime.store()).len(), 3 * WASM_PAGE_SIZE);
    assert_eq!(
        memory.word_view(runtime.store()).len(),
        3 * WASM_PAGE_SIZE / 4
    );
}

#[test]
fn read_bytes_sees_data_segments() {
    let runtime = loaded_runtime();
    let memory = runtime.memory().unwrap();
    let bytes = memory.read_bytes(runtime.store(), 1024, 5).unwrap();
    assert_eq!(bytes, b"hello");
}
