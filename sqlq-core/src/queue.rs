use crate::{Cursor, Driver, Result};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::oneshot;

/// One pending statement together with the continuation receiving its outcome.
pub(crate) struct QueueEntry<D: Driver> {
    pub(crate) statement: String,
    pub(crate) table: Arc<str>,
    pub(crate) reply: oneshot::Sender<Result<Cursor<D>>>,
}

/// Unbounded FIFO of entries plus the flag telling whether a worker is draining it.
///
/// The flag is only ever changed together with the entries (under the same lock), so an entry
/// pushed while a worker is about to stop is either popped by that worker or causes a new one
/// to start.
pub(crate) struct CommandQueue<D: Driver> {
    entries: VecDeque<QueueEntry<D>>,
    draining: bool,
}

impl<D: Driver> CommandQueue<D> {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            draining: false,
        }
    }

    pub(crate) fn enqueue(&mut self, entry: QueueEntry<D>) {
        self.entries.push_back(entry);
    }

    /// Returns true when the caller must start draining, false if a worker is already active.
    pub(crate) fn begin_drain(&mut self) -> bool {
        !std::mem::replace(&mut self.draining, true)
    }

    /// Next entry to execute. When none is left the queue goes back to idle.
    pub(crate) fn next(&mut self) -> Option<QueueEntry<D>> {
        let entry = self.entries.pop_front();
        if entry.is_none() {
            self.draining = false;
        }
        entry
    }

    /// The worker went away without reaching the end: back to idle, handing out the entries
    /// it will never run.
    pub(crate) fn abandon(&mut self) -> Vec<QueueEntry<D>> {
        self.draining = false;
        self.entries.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining
    }
}
