use crate::{
    CBox, SqliteDriver, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_changes64, sqlite3_close,
    sqlite3_column_count, sqlite3_db_handle, sqlite3_errmsg, sqlite3_finalize,
    sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt,
};
use sqlq_core::{
    Connection, Context, Driver, Error, Executor, QueryResult, Result, RowLabeled, RowNames,
    RowsAffected, stream::Stream,
};
use std::{
    ffi::{CString, c_char},
    mem, ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

// Not exposed by the bundled libsqlite3-sys bindings, but present in the linked library
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> std::ffi::c_int;
}
use tokio::task::spawn_blocking;

pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteConnection {
    /// Open (creating it if needed) the database at `target`: a file path, the `:memory:`
    /// token, or a `sqlite://` url whose query string is passed to the engine as URI parameters.
    pub async fn open(target: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <SqliteDriver as Driver>::NAME);
        let filename = match target.strip_prefix(&prefix) {
            Some(rest) => format!("file:{}", rest),
            None => target.to_owned(),
        };
        let filename =
            CString::new(filename).context("The database path contains a nul character")?;
        let connection = spawn_blocking(move || {
            let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
                sqlite3_close(p);
            });
            let rc = unsafe {
                sqlite3_open_v2(
                    filename.as_ptr(),
                    &mut *connection,
                    SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                    ptr::null(),
                )
            };
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    "Out of memory".to_string()
                } else {
                    error_message_from_ptr(&unsafe { sqlite3_errmsg(*connection) }).to_string()
                };
                return Err(Error::msg(message));
            }
            Ok(connection)
        })
        .await??;
        Ok(Self { connection })
    }

    /// Prepare and step every statement in `sql`, collecting rows and modify effects.
    fn run_blocking(connection: *mut sqlite3, sql: &str) -> Result<Vec<QueryResult>> {
        let sql = CString::new(sql).context("Could not create a CString from the query String")?;
        let mut results = Vec::new();
        let mut remaining: *const c_char = sql.as_ptr();
        loop {
            let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
                sqlite3_finalize(p);
            });
            let mut tail = ptr::null();
            let rc = unsafe {
                sqlite3_prepare_v2(connection, remaining, -1, &mut *statement, &mut tail)
            };
            if rc != SQLITE_OK {
                return Err(Error::msg(
                    error_message_from_ptr(&unsafe { sqlite3_errmsg(connection) }).to_string(),
                ));
            }
            if statement.is_null() {
                // Nothing but whitespace or comments left
                break;
            }
            results.append(&mut Self::step_all(*statement)?);
            if tail.is_null() || unsafe { *tail } == 0 {
                break;
            }
            remaining = tail;
        }
        Ok(results)
    }

    fn step_all(statement: *mut sqlite3_stmt) -> Result<Vec<QueryResult>> {
        let count = unsafe { sqlite3_column_count(statement) };
        let labels = (0..count)
            .map(|i| extract_name(statement, i))
            .collect::<Result<RowNames>>()?;
        let mut results = Vec::new();
        loop {
            match unsafe { sqlite3_step(statement) } {
                SQLITE_BUSY => {
                    continue;
                }
                SQLITE_DONE => {
                    break;
                }
                SQLITE_ROW => results.push(QueryResult::Row(RowLabeled {
                    labels: labels.clone(),
                    values: (0..count)
                        .map(|i| extract_value(statement, i))
                        .collect::<Result<_>>()?,
                })),
                _ => {
                    return Err(Error::msg(
                        error_message_from_ptr(&unsafe {
                            sqlite3_errmsg(sqlite3_db_handle(statement))
                        })
                        .to_string(),
                    ));
                }
            }
        }
        if count == 0 {
            let db = unsafe { sqlite3_db_handle(statement) };
            results.push(QueryResult::Affected(RowsAffected {
                rows_affected: unsafe { sqlite3_changes64(db) } as u64,
                last_affected_id: Some(unsafe { sqlite3_last_insert_rowid(db) }),
            }));
        }
        Ok(results)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = AtomicPtr::new(*self.connection);
        try_stream! {
            let results = spawn_blocking(move || {
                Self::run_blocking(connection.load(Ordering::Relaxed), &query)
            })
            .await??;
            for result in results {
                yield result;
            }
        }
    }
}

impl Connection for SqliteConnection {
    async fn close(mut self) -> Result<()> {
        let connection = mem::replace(&mut self.connection.ptr, ptr::null_mut());
        if connection.is_null() {
            return Ok(());
        }
        let rc = unsafe { sqlite3_close(connection) };
        if rc != SQLITE_OK {
            let error = Error::msg(
                error_message_from_ptr(&unsafe { sqlite3_errmsg(connection) }).to_string(),
            )
            .context("Could not close the sqlite connection");
            // Unfinalized statements keep it alive, let the engine release it once they are gone
            unsafe { sqlite3_close_v2(connection) };
            return Err(error);
        }
        Ok(())
    }
}
