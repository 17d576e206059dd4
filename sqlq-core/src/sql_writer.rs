use crate::{Record, Value, separated_by};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Selection criterion accepted by a find.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Criterion {
    /// Every row of the table.
    #[default]
    All,
    /// The single row having this implicit row identifier.
    RowId(i64),
    /// Rows matching every field of the record.
    Matching(Record),
}

impl From<()> for Criterion {
    fn from(_: ()) -> Self {
        Criterion::All
    }
}

impl From<i64> for Criterion {
    fn from(value: i64) -> Self {
        Criterion::RowId(value)
    }
}

impl From<i32> for Criterion {
    fn from(value: i32) -> Self {
        Criterion::RowId(value as i64)
    }
}

impl From<u32> for Criterion {
    fn from(value: u32) -> Self {
        Criterion::RowId(value as i64)
    }
}

impl From<Record> for Criterion {
    fn from(value: Record) -> Self {
        Criterion::Matching(value)
    }
}

impl<T: Into<Criterion>> From<Option<T>> for Criterion {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Dialect printer converting records into concrete SQL strings.
///
/// Every method has a default implementation producing the common dialect, drivers override
/// only what differs. The output is never escaped beyond quote doubling: table and column
/// names are expected to come from trusted input.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_none(out),
            Value::Integer(v) => write_integer!(out, *v),
            Value::Real(v) => self.write_value_float(out, *v),
            Value::Text(v) => self.write_value_string(out, v),
            Value::Blob(v) => self.write_value_blob(out, v),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    /// Finite values are written unquoted, anything else becomes a string literal.
    fn write_value_float(&self, out: &mut String, value: f64) {
        if value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            out.push_str(buffer.format_finite(value));
        } else {
            self.write_value_string(out, &value.to_string());
        }
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a blob literal in hex form: `X'CAFE'`.
    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    /// Column list of a create table, one per line, types are copied verbatim.
    fn write_columns_definition(&self, out: &mut String, columns: &Record<String>) {
        separated_by(
            out,
            columns,
            |out, (name, column_type)| {
                self.write_identifier_quoted(out, name);
                out.push(' ');
                out.push_str(column_type);
            },
            ",\n",
        );
    }

    fn write_column_names(&self, out: &mut String, record: &Record) {
        separated_by(
            out,
            record.names(),
            |out, name| self.write_identifier_quoted(out, name),
            ", ",
        );
    }

    fn write_values(&self, out: &mut String, record: &Record) {
        separated_by(out, record.values(), |out, v| self.write_value(out, v), ", ");
    }

    fn write_assignments(&self, out: &mut String, record: &Record) {
        separated_by(
            out,
            record,
            |out, (name, value)| {
                self.write_identifier_quoted(out, name);
                out.push_str(" = ");
                self.write_value(out, value);
            },
            ", ",
        );
    }

    /// Conjunction of one test per field: `IS NULL` for nulls, equality otherwise.
    fn write_predicate(&self, out: &mut String, record: &Record) {
        separated_by(
            out,
            record,
            |out, (name, value)| {
                self.write_identifier_quoted(out, name);
                if value.is_null() {
                    out.push_str(" IS NULL");
                } else {
                    out.push_str(" == ");
                    self.write_value(out, value);
                }
            },
            " AND ",
        );
    }

    fn write_create_table(&self, out: &mut String, table: &str, columns: &Record<String>) {
        out.reserve(32 + table.len() + columns.len() * 24);
        out.push_str("CREATE TABLE IF NOT EXISTS ");
        self.write_identifier_quoted(out, table);
        out.push_str(" (\n");
        self.write_columns_definition(out, columns);
        out.push_str("\n)");
    }

    fn write_insert(&self, out: &mut String, table: &str, row: &Record) {
        out.reserve(32 + table.len() + row.len() * 32);
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(out, table);
        out.push_str(" (");
        self.write_column_names(out, row);
        out.push_str(") VALUES (");
        self.write_values(out, row);
        out.push(')');
    }

    fn write_delete(&self, out: &mut String, table: &str, predicate: &Record) {
        out.reserve(32 + table.len() + predicate.len() * 32);
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(out, table);
        out.push_str(" WHERE ");
        self.write_predicate(out, predicate);
    }

    fn write_update(
        &self,
        out: &mut String,
        table: &str,
        predicate: &Record,
        assignments: &Record,
    ) {
        out.reserve(32 + table.len() + (predicate.len() + assignments.len()) * 32);
        out.push_str("UPDATE ");
        self.write_identifier_quoted(out, table);
        out.push_str(" SET ");
        self.write_assignments(out, assignments);
        out.push_str(" WHERE ");
        self.write_predicate(out, predicate);
    }

    /// The row identifier is aliased explicitly, an `INTEGER PRIMARY KEY` column would lend it
    /// its own name otherwise.
    fn write_select(&self, out: &mut String, table: &str, criterion: &Criterion) {
        out.push_str("SELECT rowid AS rowid,* FROM ");
        self.write_identifier_quoted(out, table);
        match criterion {
            Criterion::All => {}
            Criterion::Matching(predicate) if predicate.is_empty() => {}
            Criterion::RowId(id) => {
                out.push_str(" WHERE rowid == ");
                write_integer!(out, *id);
            }
            Criterion::Matching(predicate) => {
                out.push_str(" WHERE ");
                self.write_predicate(out, predicate);
            }
        }
    }
}

/// Writer for the common dialect, with no overrides.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
