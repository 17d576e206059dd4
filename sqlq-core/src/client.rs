use crate::{
    ClientOptions, CommandQueue, Criterion, Cursor, Driver, Error, Lifecycle, Persistence,
    QueueEntry, Record, Result, SqlWriter, send_value, truncate_long,
};
use std::{
    fmt::{self, Debug},
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};
use tokio::{runtime::Handle, sync::oneshot};

/// Name the engine reserves for the implicit row identifier.
pub const ROWID: &str = "rowid";

pub(crate) struct Shared<D: Driver> {
    driver: D,
    queue: Mutex<CommandQueue<D>>,
    lifecycle: tokio::sync::Mutex<Lifecycle<D>>,
    path: String,
    persistence: Persistence,
}

impl<D: Driver> Shared<D> {
    fn queue(&self) -> MutexGuard<'_, CommandQueue<D>> {
        // Every queue operation leaves it consistent
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker loop: one entry at a time, each awaited before the next is pulled.
    ///
    /// The guard exists before the first poll, a task dropped before ever running still hands
    /// the queue back.
    fn drain(self: Arc<Self>) -> impl Future<Output = ()> {
        let mut worker = Worker {
            shared: self,
            idle: false,
        };
        async move {
            let mut lifecycle = worker.shared.lifecycle.lock().await;
            loop {
                let next = worker.shared.queue().next();
                let Some(QueueEntry {
                    statement,
                    table,
                    reply,
                }) = next
                else {
                    worker.idle = true;
                    break;
                };
                let result = lifecycle
                    .execute(&worker.shared.driver, &statement)
                    .await
                    .map(|rows| {
                        Cursor::new(Client::from_shared(worker.shared.clone()), table, rows)
                    });
                send_value!(reply, result);
            }
            lifecycle.release().await;
        }
    }
}

/// Releases the queue if the worker task is dropped before the queue went idle (the runtime
/// shutting down): the entries left behind are rejected and the next operation starts a new
/// worker.
struct Worker<D: Driver> {
    shared: Arc<Shared<D>>,
    idle: bool,
}

impl<D: Driver> Drop for Worker<D> {
    fn drop(&mut self) {
        if self.idle {
            return;
        }
        let abandoned = self.shared.queue().abandon();
        log::warn!(
            "The command queue worker stopped before the queue was drained, {} statements will not run",
            abandoned.len()
        );
        for QueueEntry {
            statement, reply, ..
        } in abandoned
        {
            let error = Error::msg(format!(
                "The command queue worker stopped before executing the statement:\n{}",
                truncate_long!(statement)
            ));
            send_value!(reply, Err(error));
        }
    }
}

/// Handle to a database whose statements are serialized through a single command queue.
///
/// Every operation builds its statement, appends it to the queue synchronously and returns a
/// [`Pending`] result. Statements execute strictly in the order the operations were called,
/// one at a time, on a connection opened lazily for each burst of activity (or once, for the
/// in-memory database). Operations must be called from within a Tokio runtime when the queue
/// is idle, because that is when the worker task is spawned.
///
/// Cloning is cheap, clones share the same queue and connection.
pub struct Client<D: Driver> {
    shared: Arc<Shared<D>>,
}

impl<D: Driver> Client<D> {
    pub fn open(driver: D, path: impl Into<String>) -> Self {
        Self::with_options(driver, ClientOptions::new(path))
    }

    /// Client configured by `options`. A missing persistence mode is decided here, once, by
    /// asking the driver whether the target is transient.
    pub fn with_options(driver: D, options: ClientOptions) -> Self {
        let ClientOptions { path, persistence } = options;
        let persistence =
            persistence.unwrap_or_else(|| Persistence::for_target(&driver, &path));
        Self {
            shared: Arc::new(Shared {
                driver,
                queue: Mutex::new(CommandQueue::new()),
                lifecycle: tokio::sync::Mutex::new(Lifecycle::new(path.clone(), persistence)),
                path,
                persistence,
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<Shared<D>>) -> Self {
        Self { shared }
    }

    pub fn driver(&self) -> &D {
        &self.shared.driver
    }

    pub fn path(&self) -> &str {
        &self.shared.path
    }

    pub fn persistence(&self) -> Persistence {
        self.shared.persistence
    }

    /// Number of entries waiting to be executed (the one in flight excluded).
    pub fn queued(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_draining(&self) -> bool {
        self.shared.queue().is_draining()
    }

    /// Whether a connection is open, waits for the current burst to finish first.
    pub async fn is_connected(&self) -> bool {
        self.shared.lifecycle.lock().await.is_open()
    }

    /// How many times a connection has been opened, waits for the current burst to finish first.
    pub async fn connections_opened(&self) -> u64 {
        self.shared.lifecycle.lock().await.opened()
    }

    /// Create the table unless it exists, column types are copied verbatim.
    pub fn create(&self, table: impl AsRef<str>, columns: Record<String>) -> Pending<D> {
        let table = table.as_ref();
        if columns.is_empty() {
            return Pending::invalid(format!("Cannot create the table `{}` without columns", table));
        }
        if columns.names().any(|v| v.eq_ignore_ascii_case(ROWID)) {
            return Pending::invalid(format!(
                "Cannot create the table `{}`: `{}` is reserved for the implicit row identifier and cannot be used as a column name",
                table, ROWID
            ));
        }
        let mut sql = String::new();
        self.sql_writer().write_create_table(&mut sql, table, &columns);
        self.submit(table, sql)
    }

    /// Insert one row.
    pub fn emplace(&self, table: impl AsRef<str>, row: Record) -> Pending<D> {
        let table = table.as_ref();
        if row.is_empty() {
            return Pending::invalid(format!("Cannot insert an empty record into `{}`", table));
        }
        let mut sql = String::new();
        self.sql_writer().write_insert(&mut sql, table, &row);
        self.submit(table, sql)
    }

    /// Delete every row matching the predicate.
    pub fn remove(&self, table: impl AsRef<str>, predicate: Record) -> Pending<D> {
        let table = table.as_ref();
        if predicate.is_empty() {
            return Pending::invalid(format!(
                "Cannot delete from `{}` using an empty predicate",
                table
            ));
        }
        let mut sql = String::new();
        self.sql_writer().write_delete(&mut sql, table, &predicate);
        self.submit(table, sql)
    }

    /// Apply the assignments to every row matching the predicate.
    pub fn update(
        &self,
        table: impl AsRef<str>,
        predicate: Record,
        assignments: Record,
    ) -> Pending<D> {
        let table = table.as_ref();
        if predicate.is_empty() {
            return Pending::invalid(format!(
                "Cannot update `{}` using an empty predicate",
                table
            ));
        }
        if assignments.is_empty() {
            return Pending::invalid(format!(
                "Cannot update `{}` without any assignment",
                table
            ));
        }
        let mut sql = String::new();
        self.sql_writer()
            .write_update(&mut sql, table, &predicate, &assignments);
        self.submit(table, sql)
    }

    /// Select rows together with their row identifier: all of them, the one with a given
    /// identifier, or those matching a predicate record.
    pub fn find(&self, table: impl AsRef<str>, criterion: impl Into<Criterion>) -> Pending<D> {
        let table = table.as_ref();
        let mut sql = String::new();
        self.sql_writer()
            .write_select(&mut sql, table, &criterion.into());
        self.submit(table, sql)
    }

    /// Select every row of the table.
    pub fn find_all(&self, table: impl AsRef<str>) -> Pending<D> {
        self.find(table, Criterion::All)
    }

    fn sql_writer(&self) -> D::SqlWriter {
        self.shared.driver.sql_writer()
    }

    /// Append the statement to the queue and start a worker if none is draining it.
    fn submit(&self, table: &str, statement: String) -> Pending<D> {
        let runtime = Handle::try_current();
        let (tx, rx) = oneshot::channel();
        let entry = QueueEntry {
            statement,
            table: table.into(),
            reply: tx,
        };
        let mut queue = self.shared.queue();
        if queue.is_draining() {
            queue.enqueue(entry);
        } else {
            let handle = match runtime {
                Ok(handle) => handle,
                Err(e) => {
                    drop(queue);
                    let error = Error::new(e).context(format!(
                        "Cannot execute the statement on `{}` outside of a Tokio runtime",
                        table
                    ));
                    log::error!("{:#}", error);
                    return Pending::rejected(error);
                }
            };
            queue.enqueue(entry);
            queue.begin_drain();
            handle.spawn(self.shared.clone().drain());
        }
        Pending::waiting(rx)
    }
}

impl<D: Driver> Clone for Client<D> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<D: Driver> Debug for Client<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("driver", &D::NAME)
            .field("path", &self.path())
            .field("persistence", &self.persistence())
            .finish()
    }
}

enum PendingState<D: Driver> {
    Rejected(Option<Error>),
    Waiting(oneshot::Receiver<Result<Cursor<D>>>),
}

/// Outcome of a queued operation, resolving to the cursor over the rows the statement
/// returned.
///
/// The statement is already queued when this value is created: dropping it does not cancel
/// the statement, its result is just discarded. If the runtime running the queue shuts down
/// first, the statements still waiting resolve to an error.
#[must_use = "the statement runs regardless, but its outcome is lost unless awaited"]
pub struct Pending<D: Driver> {
    state: PendingState<D>,
}

impl<D: Driver> Pending<D> {
    pub(crate) fn waiting(receiver: oneshot::Receiver<Result<Cursor<D>>>) -> Self {
        Self {
            state: PendingState::Waiting(receiver),
        }
    }

    pub(crate) fn rejected(error: Error) -> Self {
        Self {
            state: PendingState::Rejected(Some(error)),
        }
    }

    pub(crate) fn invalid(message: String) -> Self {
        let error = Error::msg(message);
        log::error!("{:#}", error);
        Self::rejected(error)
    }

    /// True if the operation was refused before reaching the queue.
    pub fn is_rejected(&self) -> bool {
        matches!(self.state, PendingState::Rejected(..))
    }
}

impl<D: Driver> Future for Pending<D> {
    type Output = Result<Cursor<D>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PendingState::Rejected(error) => Poll::Ready(Err(error
                .take()
                .unwrap_or_else(|| Error::msg("Pending result polled after completion")))),
            PendingState::Waiting(receiver) => Pin::new(receiver).poll(cx).map(|v| {
                v.unwrap_or_else(|_| {
                    Err(Error::msg(
                        "The command queue stopped before delivering the result",
                    ))
                })
            }),
        }
    }
}

impl<D: Driver> Debug for Pending<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.state {
            PendingState::Rejected(..) => "Pending::Rejected",
            PendingState::Waiting(..) => "Pending::Waiting",
        })
    }
}
