//! A small SQLite client built only on the public runtime API.
//!
//! Drives `sqlite3_open`, `sqlite3_exec`, `sqlite3_errmsg`, `sqlite3_free` and
//! `sqlite3_close`. Result rows arrive through a row-callback trampoline, so nothing here
//! knows about statements, column types or result codes beyond `SQLITE_OK`.

use crate::messages::interop_errors::InteropError;
use crate::runtime::strings::{read_cstring, read_cstring_opt};
use crate::runtime::{HostState, Runtime};
use crate::settings::POINTER_SIZE;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::{Arc, Mutex};
use wasmtime::{Caller, Val};

pub const SQLITE_OK: i32 = 0;
pub const IN_MEMORY_DATABASE: &str = ":memory:";

// int (*callback)(void* arg, int column_count, char** values, char** names)
const ROW_CALLBACK_SIGNATURE: &str = "iiiii";

pub const DEMO_SCRIPT: &str = "CREATE TABLE foo (name TEXT, bar TEXT); \
                               INSERT INTO foo VALUES ('a', 'sdf'), ('b', 'zza');";
pub const DEMO_QUERY: &str = "SELECT * FROM foo";

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("{operation} failed with code {code}: {message}")]
    Sqlite {
        operation: &'static str,
        code: i32,
        message: String,
    },

    #[error(transparent)]
    Interop(#[from] InteropError),
}

/// A `sqlite3*` owned by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Database {
    handle: u32,
}

impl Database {
    pub fn handle(&self) -> u32 {
        self.handle
    }
}

/// One result row: column names with their text values, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.fields.push((column.into(), value));
    }

    /// `None` if there is no such column, `Some(None)` for SQL `NULL`
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }

    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// A JSON object with keys in column order
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

pub fn open_database(runtime: &mut Runtime, filename: &str) -> Result<Database, DemoError> {
    let open = runtime.typed_export::<(u32, u32), i32>("sqlite3_open")?;

    let (code, handle) = runtime.with_scratch(|runtime| {
        let out = runtime.scratch_allocate(POINTER_SIZE)?;
        runtime
            .memory()?
            .poke_pointer(runtime.store_mut(), out, 0)?;

        let code = runtime.with_cstring(filename, |runtime, filename| {
            open.call(runtime.store_mut(), (filename.ptr, out))
                .map_err(|e| InteropError::platform("sqlite3_open trapped", e))
        })?;

        Ok((code, runtime.peek_pointer(out)?))
    })?;

    let database = Database { handle };
    if code != SQLITE_OK {
        let message = error_message(runtime, database)?;
        // sqlite3_open hands out a handle even on failure and it still needs closing
        if handle != 0 {
            close_database(runtime, database)?;
        }

        return Err(DemoError::Sqlite {
            operation: "sqlite3_open",
            code,
            message,
        });
    }

    Ok(database)
}

/// Run `sql` through `sqlite3_exec`, with `callback` as the row callback (0 for none)
pub fn exec(
    runtime: &mut Runtime,
    database: Database,
    sql: &str,
    callback: u32,
) -> Result<(), DemoError> {
    let exec = runtime.typed_export::<(u32, u32, u32, u32, u32), i32>("sqlite3_exec")?;
    let free = runtime.typed_export::<u32, ()>("sqlite3_free")?;

    let (code, errmsg) = runtime.with_scratch(|runtime| {
        let errmsg_out = runtime.scratch_allocate(POINTER_SIZE)?;
        runtime
            .memory()?
            .poke_pointer(runtime.store_mut(), errmsg_out, 0)?;

        let code = runtime.with_cstring(sql, |runtime, sql| {
            exec.call(
                runtime.store_mut(),
                (database.handle, sql.ptr, callback, 0, errmsg_out),
            )
            .map_err(|e| InteropError::platform("sqlite3_exec trapped", e))
        })?;

        Ok((code, runtime.peek_pointer(errmsg_out)?))
    })?;

    if code == SQLITE_OK {
        return Ok(());
    }

    let message = match errmsg {
        0 => error_message(runtime, database)?,
        ptr => {
            let message = runtime.read_cstring(ptr)?;
            free.call(runtime.store_mut(), ptr)
                .map_err(|e| InteropError::platform("sqlite3_free trapped", e))?;
            message
        }
    };

    Err(DemoError::Sqlite {
        operation: "sqlite3_exec",
        code,
        message,
    })
}

/// Run a query and collect every row the callback receives.
///
/// Each call installs a new trampoline, and table slots are never reclaimed.
pub fn query_rows(
    runtime: &mut Runtime,
    database: Database,
    sql: &str,
) -> Result<Vec<Row>, DemoError> {
    let rows = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&rows);
    let callback = runtime.install_function(
        ROW_CALLBACK_SIGNATURE,
        move |caller: Caller<'_, HostState>, params: &[Val], results: &mut [Val]| {
            let row = read_row(&caller, params).map_err(InteropError::into_wasmtime)?;
            match sink.lock() {
                Ok(mut rows) => rows.push(row),
                Err(_) => return Err(wasmtime::Error::msg("row sink lock poisoned")),
            }

            // Non-zero would abort the statement
            results[0] = Val::I32(0);
            Ok(())
        },
    )?;

    exec(runtime, database, sql, callback)?;

    let collected = match rows.lock() {
        Ok(mut rows) => std::mem::take(&mut *rows),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };

    Ok(collected)
}

fn read_row(caller: &Caller<'_, HostState>, params: &[Val]) -> Result<Row, InteropError> {
    let memory = caller.data().memory()?;

    let (column_count, values, names) = match params {
        [_, Val::I32(count), Val::I32(values), Val::I32(names)] => {
            (*count as u32, *values as u32, *names as u32)
        }
        _ => {
            return Err(InteropError::invalid_signature(
                ROW_CALLBACK_SIGNATURE,
                format!("row callback got {} arguments", params.len()),
            ));
        }
    };

    let mut row = Row::new();
    for column in 0..column_count {
        let offset = column * POINTER_SIZE;
        let name_ptr = memory.peek_pointer(caller, names + offset)?;
        let value_ptr = memory.peek_pointer(caller, values + offset)?;

        row.push(
            read_cstring(memory, caller, name_ptr)?,
            read_cstring_opt(memory, caller, value_ptr)?,
        );
    }

    Ok(row)
}

fn error_message(runtime: &mut Runtime, database: Database) -> Result<String, DemoError> {
    let errmsg = runtime.typed_export::<u32, u32>("sqlite3_errmsg")?;
    let ptr = errmsg
        .call(runtime.store_mut(), database.handle)
        .map_err(|e| InteropError::platform("sqlite3_errmsg trapped", e))?;

    Ok(runtime.read_cstring(ptr)?)
}

pub fn close_database(runtime: &mut Runtime, database: Database) -> Result<(), DemoError> {
    let close = runtime.typed_export::<u32, i32>("sqlite3_close")?;
    let code = close
        .call(runtime.store_mut(), database.handle)
        .map_err(|e| InteropError::platform("sqlite3_close trapped", e))?;

    if code != SQLITE_OK {
        return Err(DemoError::Sqlite {
            operation: "sqlite3_close",
            code,
            message: error_message(runtime, database)?,
        });
    }

    Ok(())
}

/// Create a table in an in-memory database, insert two rows and read them back
pub fn run_demo(runtime: &mut Runtime) -> Result<Vec<Row>, DemoError> {
    let database = open_database(runtime, IN_MEMORY_DATABASE)?;

    let rows = exec(runtime, database, DEMO_SCRIPT, 0)
        .and_then(|_| query_rows(runtime, database, DEMO_QUERY));

    let closed = close_database(runtime, database);
    let rows = rows?;
    closed?;

    Ok(rows)
}

#[cfg(test)]
#[path = "tests/demo_tests.rs"]
mod tests;
