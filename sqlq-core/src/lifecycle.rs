use crate::{
    Connection, Context, Driver, Executor, Result, RowLabeled, stream::TryStreamExt,
    truncate_long,
};

/// Reserved path of the transient database that lives only inside its connection.
pub const MEMORY: &str = ":memory:";

/// Whether the connection is released after each burst of statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Opened when work arrives, closed once the queue drains.
    PerBurst,
    /// Opened once and kept for the whole life of the client. Required by the in-memory
    /// database: closing its connection discards its contents.
    Permanent,
}

impl Persistence {
    /// Mode required by `target`: permanent when the driver reports it as transient.
    pub fn for_target<D: Driver>(driver: &D, target: &str) -> Self {
        if driver.is_transient(target) {
            Persistence::Permanent
        } else {
            Persistence::PerBurst
        }
    }
}

/// Configuration of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Database location as understood by the driver.
    pub path: String,
    /// Explicit mode, when missing the driver derives it from `path` once the client is built.
    pub persistence: Option<Persistence>,
}

impl ClientOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            persistence: None,
        }
    }

    pub fn memory() -> Self {
        Self::new(MEMORY)
    }

    pub fn persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

/// Owner of the single connection handle, it moves between the Closed and Open states.
pub(crate) struct Lifecycle<D: Driver> {
    path: String,
    persistence: Persistence,
    connection: Option<D::Connection>,
    opened: u64,
}

impl<D: Driver> Lifecycle<D> {
    pub(crate) fn new(path: String, persistence: Persistence) -> Self {
        Self {
            path,
            persistence,
            connection: None,
            opened: 0,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Number of Closed to Open transitions so far.
    pub(crate) fn opened(&self) -> u64 {
        self.opened
    }

    /// Open the connection unless it is already open.
    async fn open(&mut self, driver: &D) -> Result<&mut D::Connection> {
        if self.connection.is_none() {
            let connection = driver
                .connect(&self.path)
                .await
                .with_context(|| {
                    format!(
                        "While opening the {} database `{}`",
                        D::NAME,
                        self.path
                    )
                })?;
            self.opened += 1;
            log::debug!("Opened the {} database `{}`", D::NAME, self.path);
            self.connection = Some(connection);
        }
        self.connection
            .as_mut()
            .ok_or_else(|| crate::Error::msg("The connection was not retained after opening"))
    }

    /// Run one statement on the (lazily opened) connection and materialize every row it returns.
    pub(crate) async fn execute(&mut self, driver: &D, statement: &str) -> Result<Vec<RowLabeled>> {
        let result = async {
            let connection = self.open(driver).await?;
            log::debug!("Executing: {}", truncate_long!(statement));
            connection
                .fetch(statement.to_owned())
                .try_collect::<Vec<_>>()
                .await
                .with_context(|| {
                    format!("While executing the statement:\n{}", truncate_long!(statement))
                })
        }
        .await;
        if let Err(error) = &result {
            log::error!("{:#}", error);
        }
        result
    }

    /// End of a burst: the connection is closed unless the mode is permanent.
    pub(crate) async fn release(&mut self) {
        if self.persistence == Persistence::Permanent {
            return;
        }
        if let Some(connection) = self.connection.take() {
            match connection.close().await {
                Ok(()) => log::debug!("Closed the {} database `{}`", D::NAME, self.path),
                Err(e) => log::error!(
                    "{:#}",
                    e.context(format!("While closing the database `{}`", self.path))
                ),
            }
        }
    }
}
