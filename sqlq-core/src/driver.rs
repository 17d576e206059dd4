use crate::{Connection, MEMORY, Result, SqlWriter};
use std::future::Future;

/// Entry point of a backend: names it, opens its connections and prints its dialect.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Whether the database at `target` lives only inside its connection, closing the
    /// connection would discard it.
    fn is_transient(&self, target: &str) -> bool {
        target == MEMORY
    }

    /// Open a new connection to the database located at `target`.
    fn connect(&self, target: &str) -> impl Future<Output = Result<Self::Connection>> + Send;
}
