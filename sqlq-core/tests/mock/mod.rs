use sqlq_core::{
    Connection, Driver, Error, Executor, GenericSqlWriter, QueryResult, Result, RowLabeled,
    RowsAffected, Value,
    stream::{self, Stream, StreamExt},
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Observations shared by every connection of a mock driver.
#[derive(Default, Debug)]
pub struct Journal {
    pub statements: Mutex<Vec<String>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Journal {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

/// Engine stand in: every SELECT returns three rows, a statement containing `FAIL` errors,
/// opening the target `unreachable` errors.
#[derive(Default, Debug, Clone)]
pub struct MockDriver {
    pub journal: Arc<Journal>,
}

pub struct MockConnection {
    driver: MockDriver,
}

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }

    async fn connect(&self, target: &str) -> Result<MockConnection> {
        if target == "unreachable" {
            return Err(Error::msg("unable to open database file"));
        }
        self.journal.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            driver: self.clone(),
        })
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let journal = self.driver.journal.clone();
        stream::once(async move {
            let current = journal.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            journal.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1)).await;
            journal.statements.lock().unwrap().push(query.clone());
            journal.in_flight.fetch_sub(1, Ordering::SeqCst);
            if query.contains("FAIL") {
                return vec![Err(Error::msg("near \"FAIL\": syntax error"))];
            }
            if query.starts_with("SELECT") {
                let labels: Arc<[String]> = Arc::from(["rowid".to_string(), "name".to_string()]);
                (1..=3)
                    .map(|i| {
                        Ok(QueryResult::Row(RowLabeled::new(
                            labels.clone(),
                            [Value::Integer(i), Value::Text(format!("row{}", i))].into(),
                        )))
                    })
                    .collect()
            } else {
                vec![Ok(QueryResult::Affected(RowsAffected {
                    rows_affected: 1,
                    last_affected_id: None,
                }))]
            }
        })
        .flat_map(stream::iter)
    }
}

impl Connection for MockConnection {
    async fn close(self) -> Result<()> {
        self.driver.journal.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
