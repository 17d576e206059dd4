use sqlq_core::SqlWriter;

/// SQLite dialect, the common one written by the default methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
