use crate::{SqliteConnection, SqliteSqlWriter};
use sqlq_core::{Driver, MEMORY, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter::new()
    }

    /// True for `:memory:`, `file::memory:` and any URI with `mode=memory`, also behind the
    /// `sqlite://` prefix.
    fn is_transient(&self, target: &str) -> bool {
        let prefix = format!("{}://", Self::NAME);
        let target = target.strip_prefix(&prefix).unwrap_or(target);
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let path = path.strip_prefix("file:").unwrap_or(path);
        path == MEMORY || query.split('&').any(|v| v == "mode=memory")
    }

    async fn connect(&self, target: &str) -> Result<SqliteConnection> {
        SqliteConnection::open(target).await
    }
}

#[cfg(test)]
mod tests {
    use crate::SqliteDriver;
    use sqlq_core::Driver;

    #[test]
    fn transient_targets() {
        let driver = SqliteDriver::new();
        assert!(driver.is_transient(":memory:"));
        assert!(driver.is_transient("sqlite://:memory:"));
        assert!(driver.is_transient("file::memory:"));
        assert!(driver.is_transient("file::memory:?cache=shared"));
        assert!(driver.is_transient("sqlite://shared?mode=memory&cache=shared"));
        assert!(driver.is_transient("file:memdb1?mode=memory"));
        assert!(!driver.is_transient("data.sqlite"));
        assert!(!driver.is_transient("sqlite://data.sqlite?mode=rwc"));
        assert!(!driver.is_transient("sqlite://memory.sqlite"));
    }
}
