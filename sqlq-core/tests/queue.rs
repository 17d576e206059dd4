mod mock;

#[cfg(test)]
mod tests {
    use crate::mock::MockDriver;
    use sqlq_core::{Client, ClientOptions, Criterion, MEMORY, Persistence, Record, record};
    use std::sync::atomic::Ordering;
    use tokio::runtime::Builder;

    #[tokio::test]
    async fn statements_run_in_issue_order_one_at_a_time() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, "queue.sqlite");
        let mut pending = Vec::new();
        let mut expected = Vec::new();
        for i in 0..20 {
            if i % 3 == 0 {
                pending.push(client.find("numbers", i as i64));
                expected.push(format!(
                    "SELECT rowid AS rowid,* FROM \"numbers\" WHERE rowid == {}",
                    i
                ));
            } else {
                pending.push(client.emplace("numbers", record! { "n" => i }));
                expected.push(format!("INSERT INTO \"numbers\" (\"n\") VALUES ({})", i));
            }
        }
        assert!(client.is_draining());
        for p in pending.into_iter().rev() {
            p.await.expect("Every statement should succeed");
        }
        assert_eq!(journal.statements(), expected);
        assert_eq!(journal.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_are_queued() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        let tasks = (0..8)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .emplace("t", record! { "task" => i })
                        .await
                        .map(|cursor| cursor.len())
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 0);
        }
        assert_eq!(journal.statements().len(), 8);
        assert_eq!(journal.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_scoped_to_its_entry() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        let first = client.find_all("before");
        let failing = client.find_all("FAIL");
        let last = client.find_all("after");
        assert_eq!(first.await.unwrap().len(), 3);
        let error = failing.await.expect_err("The statement should fail");
        assert!(format!("{:#}", error).contains("syntax error"));
        assert_eq!(last.await.unwrap().len(), 3);
        assert_eq!(journal.statements().len(), 3);
    }

    #[tokio::test]
    async fn file_connection_is_closed_after_each_burst() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, "burst.sqlite");
        assert_eq!(client.persistence(), Persistence::PerBurst);
        assert!(!client.is_connected().await);
        let a = client.find_all("t");
        let b = client.find_all("t");
        a.await.unwrap();
        b.await.unwrap();
        assert!(!client.is_connected().await);
        assert_eq!(client.connections_opened().await, 1);
        assert!(!client.is_draining());
        client.find_all("t").await.unwrap();
        assert!(!client.is_connected().await);
        assert_eq!(client.connections_opened().await, 2);
        assert_eq!(journal.opened.load(Ordering::SeqCst), 2);
        assert_eq!(journal.closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn memory_connection_stays_open() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        assert_eq!(client.persistence(), Persistence::Permanent);
        client.find_all("t").await.unwrap();
        assert!(client.is_connected().await);
        client.find_all("t").await.unwrap();
        assert!(client.is_connected().await);
        assert_eq!(client.connections_opened().await, 1);
        assert_eq!(journal.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persistence_can_be_chosen_explicitly() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::with_options(
            driver,
            ClientOptions::new("kept.sqlite").persistence(Persistence::Permanent),
        );
        client.find_all("t").await.unwrap();
        client.find_all("t").await.unwrap();
        assert!(client.is_connected().await);
        assert_eq!(journal.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn persistence_is_decided_by_the_driver_unless_explicit() {
        let client = Client::with_options(MockDriver::default(), ClientOptions::memory());
        assert_eq!(client.persistence(), Persistence::Permanent);
        let client = Client::open(MockDriver::default(), "file.sqlite");
        assert_eq!(client.persistence(), Persistence::PerBurst);
        let client = Client::with_options(
            MockDriver::default(),
            ClientOptions::memory().persistence(Persistence::PerBurst),
        );
        assert_eq!(client.persistence(), Persistence::PerBurst);
    }

    #[tokio::test]
    async fn open_failure_is_reported_to_the_entry() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, "unreachable");
        let first = client.find_all("t");
        let second = client.emplace("t", record! { "a" => 1 });
        let error = first.await.expect_err("Opening should fail");
        assert!(format!("{:#}", error).contains("unable to open database file"));
        assert!(second.await.is_err());
        assert!(journal.statements().is_empty());
        assert!(!client.is_draining());
    }

    #[tokio::test]
    async fn validation_rejects_before_queueing() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        let columns: Record<String> = record! { "rowid" => "INTEGER", "memo" => "TEXT" };
        let pending = client.create("t", columns);
        assert!(pending.is_rejected());
        let error = pending.await.expect_err("rowid must be rejected");
        assert!(error.to_string().contains("`rowid` is reserved"));
        let columns: Record<String> = record! { "memo" => "TEXT", "RowID" => "INTEGER" };
        assert!(client.create("t", columns).await.is_err());
        assert!(client.create("t", Record::new()).await.is_err());
        assert!(client.emplace("t", Record::new()).await.is_err());
        assert!(client.remove("t", Record::new()).await.is_err());
        assert!(
            client
                .update("t", Record::new(), record! { "a" => 1 })
                .await
                .is_err()
        );
        assert!(
            client
                .update("t", record! { "a" => 1 }, Record::new())
                .await
                .is_err()
        );
        assert_eq!(client.queued(), 0);
        assert!(journal.statements().is_empty());
    }

    #[tokio::test]
    async fn dropped_pending_still_runs() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        drop(client.remove("t", record! { "id" => 9 }));
        client.find("t", Criterion::All).await.unwrap();
        assert_eq!(
            journal.statements(),
            [
                "DELETE FROM \"t\" WHERE \"id\" == 9",
                "SELECT rowid AS rowid,* FROM \"t\"",
            ]
        );
    }

    #[test]
    fn runtime_shutdown_rejects_the_waiting_entries() {
        let driver = MockDriver::default();
        let journal = driver.journal.clone();
        let client = Client::open(driver, MEMORY);
        let runtime = Builder::new_current_thread().enable_time().build().unwrap();
        // The worker is spawned but never polled before the runtime goes away
        let (first, second) = runtime.block_on(async {
            (
                client.find_all("t"),
                client.emplace("t", record! { "a" => 1 }),
            )
        });
        assert!(client.is_draining());
        assert_eq!(client.queued(), 2);
        drop(runtime);
        assert!(!client.is_draining());
        assert_eq!(client.queued(), 0);
        let error = futures::executor::block_on(first).expect_err("The entry should be rejected");
        assert!(format!("{:#}", error).contains("stopped before executing"));
        assert!(futures::executor::block_on(second).is_err());
        assert!(journal.statements().is_empty());

        let runtime = Builder::new_current_thread().enable_time().build().unwrap();
        let cursor = runtime
            .block_on(async { client.find_all("t").await })
            .expect("A new runtime starts a new worker");
        assert_eq!(cursor.len(), 3);
        assert_eq!(journal.statements().len(), 1);
    }

    #[test]
    fn outside_of_runtime_is_rejected() {
        let client = Client::open(MockDriver::default(), MEMORY);
        let pending = client.find_all("t");
        assert!(pending.is_rejected());
        assert!(futures::executor::block_on(pending).is_err());
        assert!(!client.is_draining());
        assert_eq!(client.queued(), 0);
    }
}
