use sqlwasm::demo::{self, Row};
use sqlwasm::{ErrorKind, ModuleSource, Runtime, RuntimeConfig};
use std::env;
use std::path::PathBuf;
use wasmtime::Val;

const FIXTURE_WAT: &str = include_str!("fixtures/interop_fixture.wat");

// Set to an emscripten build of SQLite to run the end-to-end scenario against it
const REAL_MODULE_VAR: &str = "SQLWASM_MODULE";

fn fixture_runtime() -> Runtime {
    let bytes = wat::parse_str(FIXTURE_WAT).expect("fixture should assemble");
    let mut runtime = Runtime::default();
    runtime
        .load(ModuleSource::Bytes(bytes))
        .expect("fixture should load");
    runtime
}

fn expected_rows() -> Vec<Row> {
    let mut first = Row::new();
    first.push("name", Some(String::from("a")));
    first.push("bar", Some(String::from("sdf")));

    let mut second = Row::new();
    second.push("name", Some(String::from("b")));
    second.push("bar", Some(String::from("zza")));

    vec![first, second]
}

#[test]
fn trampoline_is_callable_through_the_table() {
    let mut runtime = fixture_runtime();

    let index = runtime
        .install_function("iii", |_caller, params, results| {
            let (Val::I32(a), Val::I32(b)) = (&params[0], &params[1]) else {
                panic!("unexpected params {:?}", params);
            };
            results[0] = Val::I32(a + b);
            Ok(())
        })
        .expect("install should succeed");

    let invoke = runtime
        .typed_export::<(u32, i32, i32), i32>("invoke_ii")
        .expect("fixture exports invoke_ii");
    let result = invoke
        .call(runtime.store_mut(), (index, 3, 4))
        .expect("indirect call should succeed");

    assert_eq!(result, 7);
}

#[test]
fn nothing_works_until_load_and_everything_after() {
    let mut runtime = Runtime::default();
    let err = runtime
        .alloc_string("early", None, None)
        .expect_err("not loaded yet");
    assert_eq!(err.kind(), ErrorKind::NotInitialized);

    let bytes = wat::parse_str(FIXTURE_WAT).expect("fixture should assemble");
    runtime.load(ModuleSource::Bytes(bytes)).expect("load");

    let string = runtime.alloc_string("early", None, None).unwrap();
    assert_eq!(runtime.read_cstring(string.ptr).unwrap(), "early");
}

#[test]
fn unresolved_imports_only_fail_when_called() {
    // Loading links `env.__syscall_openat` and `wasi_snapshot_preview1.fd_write` to stubs
    let mut runtime = fixture_runtime();

    let err = runtime
        .call_export("call_missing", &[])
        .expect_err("calling a stub fails");
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
    assert!(err.to_string().contains("__syscall_openat"));

    // The instance stays usable afterwards
    assert_ne!(runtime.allocate(4).unwrap(), 0);
}

#[test]
fn scratch_pointer_survives_a_round_of_allocations() {
    let mut runtime = fixture_runtime();
    let mark = runtime.scratch_checkpoint().unwrap();

    for size in [4, 16, 100, 3] {
        runtime.scratch_allocate(size).unwrap();
    }
    runtime.scratch_restore(mark).unwrap();

    assert_eq!(runtime.scratch_checkpoint().unwrap(), mark);
}

#[test]
fn demo_against_the_fixture() {
    let mut runtime = fixture_runtime();
    let rows = demo::run_demo(&mut runtime).expect("demo should run");
    assert_eq!(rows, expected_rows());
}

#[test]
fn demo_against_a_real_sqlite_build() {
    let Ok(path) = env::var(REAL_MODULE_VAR) else {
        eprintln!("{} is not set, skipping the real module scenario", REAL_MODULE_VAR);
        return;
    };

    let mut runtime = Runtime::new(RuntimeConfig::new(PathBuf::from(path)));
    runtime
        .load(ModuleSource::Default)
        .expect("real module should load");

    let rows = demo::run_demo(&mut runtime).expect("demo should run");
    assert_eq!(rows, expected_rows());
}
