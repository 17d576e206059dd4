use crate::{Client, Driver, Pending, Record, RowLabeled};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};

/// Stateful view over the rows a statement returned.
///
/// The rows are a snapshot taken when the statement completed, later statements never change
/// them. The cursor keeps a position (initially before the first row) moved by
/// [`Cursor::step_forward`], [`Cursor::step_back`] and [`Cursor::reset`].
///
/// Mutations ([`Cursor::update`], [`Cursor::remove`] and the [`RemoveRow`] actions) do not touch
/// the snapshot: they queue a new statement on the owning client, behind anything already
/// queued, using the row itself as predicate.
pub struct Cursor<D: Driver> {
    client: Client<D>,
    table: Arc<str>,
    rows: Arc<[RowLabeled]>,
    position: usize,
}

impl<D: Driver> Cursor<D> {
    pub(crate) fn new(client: Client<D>, table: Arc<str>, rows: Vec<RowLabeled>) -> Self {
        Self {
            client,
            table,
            rows: rows.into(),
            position: 0,
        }
    }

    /// Table the rows come from, mutations are sent to it.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn client(&self) -> &Client<D> {
        &self.client
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows stepped over, the next forward step yields the row at this index.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, index: usize) -> Option<&RowLabeled> {
        self.rows.get(index)
    }

    pub fn all_data(&self) -> &[RowLabeled] {
        &self.rows
    }

    /// Yield the row at the current position and move past it.
    pub fn step_forward(&mut self) -> Step<D> {
        match self.rows.get(self.position) {
            Some(row) => {
                let step = self.yielded(row);
                self.position += 1;
                step
            }
            None => Step::done(),
        }
    }

    /// Move back one row and yield it. After the rows are exhausted forward, stepping back
    /// visits them in reverse order.
    pub fn step_back(&mut self) -> Step<D> {
        if self.position == 0 {
            return Step::done();
        }
        self.position -= 1;
        self.yielded(&self.rows[self.position])
    }

    /// Go back to the first row and yield it without moving past it.
    pub fn reset(&mut self) -> Step<D> {
        self.position = 0;
        match self.rows.first() {
            Some(row) => Step {
                value: Some(row.clone()),
                done: false,
                remove: None,
            },
            None => Step::done(),
        }
    }

    /// Queue an update of the row at `index`, matched by all of its original fields.
    pub fn update(&self, index: usize, assignments: Record) -> Pending<D> {
        match self.rows.get(index) {
            Some(row) => self.client.update(&self.table, row.into(), assignments),
            None => self.out_of_range(index),
        }
    }

    /// Queue the deletion of the row at `index`, matched by all of its original fields.
    pub fn remove(&self, index: usize) -> Pending<D> {
        match self.rows.get(index) {
            Some(row) => self.client.remove(&self.table, row.into()),
            None => self.out_of_range(index),
        }
    }

    fn yielded(&self, row: &RowLabeled) -> Step<D> {
        Step {
            value: Some(row.clone()),
            done: false,
            remove: Some(RemoveRow {
                client: self.client.clone(),
                table: self.table.clone(),
                predicate: row.into(),
            }),
        }
    }

    fn out_of_range(&self, index: usize) -> Pending<D> {
        Pending::invalid(format!(
            "There is no row at index {} in a cursor over `{}` holding {} rows",
            index,
            self.table,
            self.rows.len()
        ))
    }
}

impl<D: Driver> Clone for Cursor<D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            table: self.table.clone(),
            rows: self.rows.clone(),
            position: self.position,
        }
    }
}

impl<D: Driver> Debug for Cursor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("table", &self.table)
            .field("position", &self.position)
            .field("rows", &self.rows)
            .finish()
    }
}

/// Forward iteration over the remaining rows, without building remove actions.
impl<D: Driver> Iterator for Cursor<D> {
    type Item = RowLabeled;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.get(self.position)?.clone();
        self.position += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<D: Driver> ExactSizeIterator for Cursor<D> {}

/// Result of moving a cursor: the row reached (if any) and whether the end was hit.
pub struct Step<D: Driver> {
    pub value: Option<RowLabeled>,
    pub done: bool,
    remove: Option<RemoveRow<D>>,
}

impl<D: Driver> Step<D> {
    fn done() -> Self {
        Self {
            value: None,
            done: true,
            remove: None,
        }
    }

    /// Action deleting the row this step yielded. Absent for exhausted steps and resets.
    pub fn remove_action(&self) -> Option<&RemoveRow<D>> {
        self.remove.as_ref()
    }

    pub fn into_remove_action(self) -> Option<RemoveRow<D>> {
        self.remove
    }
}

impl<D: Driver> Debug for Step<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("value", &self.value)
            .field("done", &self.done)
            .field("remove", &self.remove.is_some())
            .finish()
    }
}

/// Deferred deletion of one row, bound to the table and the row's field values.
pub struct RemoveRow<D: Driver> {
    client: Client<D>,
    table: Arc<str>,
    predicate: Record,
}

impl<D: Driver> RemoveRow<D> {
    pub fn predicate(&self) -> &Record {
        &self.predicate
    }

    /// Queue the deletion.
    pub fn run(&self) -> Pending<D> {
        self.client.remove(&self.table, self.predicate.clone())
    }
}

impl<D: Driver> Debug for RemoveRow<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoveRow")
            .field("table", &self.table)
            .field("predicate", &self.predicate)
            .finish()
    }
}
