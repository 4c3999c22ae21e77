//! Tests for the demo client against the fixture's canned sqlite3 exports.

use super::{DemoError, Row, close_database, exec, open_database, query_rows, run_demo};
use crate::runtime::test_support::{call_i32, loaded_runtime};

fn row(fields: &[(&str, &str)]) -> Row {
    let mut row = Row::new();
    for (column, value) in fields {
        row.push(*column, Some(value.to_string()));
    }
    row
}

#[test]
fn demo_returns_both_rows_in_insertion_order() {
    let mut runtime = loaded_runtime();
    let rows = run_demo(&mut runtime).expect("demo should run");

    assert_eq!(
        rows,
        vec![
            row(&[("name", "a"), ("bar", "sdf")]),
            row(&[("name", "b"), ("bar", "zza")]),
        ]
    );
}

#[test]
fn exec_without_callback_reports_no_rows() {
    let mut runtime = loaded_runtime();
    let database = open_database(&mut runtime, ":memory:").unwrap();
    assert_eq!(database.handle(), 4242);

    exec(&mut runtime, database, "SELECT 1", 0).unwrap();
    close_database(&mut runtime, database).unwrap();
}

#[test]
fn failed_exec_carries_the_sqlite_message() {
    let mut runtime = loaded_runtime();
    let database = open_database(&mut runtime, ":memory:").unwrap();

    let err = query_rows(&mut runtime, database, "BROKEN").expect_err("fixture rejects it");
    match err {
        DemoError::Sqlite {
            operation,
            code,
            message,
        } => {
            assert_eq!(operation, "sqlite3_exec");
            assert_eq!(code, 1);
            assert_eq!(message, "fake sqlite: unsupported sql");
        }
        other => panic!("expected a sqlite error, got {:?}", other),
    }
}

#[test]
fn demo_leaves_no_scratch_or_heap_behind() {
    let mut runtime = loaded_runtime();
    let mark = runtime.scratch_checkpoint().unwrap();

    run_demo(&mut runtime).unwrap();

    assert_eq!(runtime.scratch_checkpoint().unwrap(), mark);
    // One free per marshalled string: the filename and two scripts
    assert_eq!(call_i32(&mut runtime, "free_calls", &[]), 3);
}

#[test]
fn rows_serialize_in_column_order() {
    let mut row = row(&[("name", "a"), ("bar", "sdf")]);
    row.push("missing", None);

    assert_eq!(row.get("bar"), Some(Some("sdf")));
    assert_eq!(row.get("missing"), Some(None));
    assert_eq!(row.get("nope"), None);
    assert_eq!(
        serde_json::to_string(&row).unwrap(),
        r#"{"name":"a","bar":"sdf","missing":null}"#
    );
}
