use crate::{RowLabeled, Value};
use std::{mem, slice};

/// Insertion ordered mapping from field name to value.
///
/// It is both the payload of an insert and, when used as a predicate, the conjunction of one
/// equality (or `IS NULL`) test per field. Column definitions use `Record<String>`, mapping the
/// column name to its verbatim type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V = Value> {
    fields: Vec<(String, V)>,
}

impl<V> Record<V> {
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set the field, replacing the previous value in place when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<V>) -> Option<V> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, current)) => Some(mem::replace(current, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Builder flavour of [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<V>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        let position = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(position).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> RecordIter<'_, V> {
        RecordIter {
            inner: self.fields.iter(),
        }
    }
}

impl<V> Default for Record<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RecordIter<'a, V> {
    inner: slice::Iter<'a, (String, V)>,
}

impl<'a, V> Iterator for RecordIter<'a, V> {
    type Item = (&'a str, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(n, v)| (n.as_str(), v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, V> IntoIterator for &'a Record<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = RecordIter<'a, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> IntoIterator for Record<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Record<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut result = Record::new();
        for (k, v) in iter {
            result.set(k.into(), v);
        }
        result
    }
}

impl<K: Into<String>, V, const N: usize> From<[(K, V); N]> for Record<V> {
    fn from(value: [(K, V); N]) -> Self {
        value.into_iter().collect()
    }
}

/// A result row turns into the predicate that matches exactly its own field values.
impl From<&RowLabeled> for Record {
    fn from(value: &RowLabeled) -> Self {
        value
            .names()
            .iter()
            .cloned()
            .zip(value.values().iter().cloned())
            .collect()
    }
}

/// Build a [`Record`] from `name => value` pairs, values are converted with `Into`.
///
/// ```rust
/// use sqlq_core::{Record, Value, record};
/// let row: Record = record! { "from" => "alice", "nonce" => 4, "memo" => None::<String> };
/// assert_eq!(row.get("nonce"), Some(&Value::Integer(4)));
/// let columns: Record<String> = record! { "from" => "TEXT", "nonce" => "INTEGER" };
/// assert_eq!(columns.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.set($name, $value);
        )+
        record
    }};
}
