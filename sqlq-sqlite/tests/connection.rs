#[cfg(test)]
mod tests {
    use sqlq_core::{
        Client, Connection, Executor, MEMORY, Persistence, Record, Value, record,
        stream::StreamExt,
    };
    use sqlq_sqlite::{SqliteConnection, SqliteDriver};
    use sqlq_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::open(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not open the database")
            .close()
            .await
            .expect("Could not close the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::open(&format!("sqlite://{}?mode=ro", DB_PATH))
            .await
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::open(&format!("sqlite://{}?mode=ro", DB_PATH))
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[tokio::test]
    async fn unreachable_path() {
        silent_logs! {
            assert!(
                SqliteConnection::open("../target/debug/missing/directory/db.sqlite")
                    .await
                    .is_err()
            );
            let path = "../target/debug/missing/directory/db.sqlite";
            let client = Client::open(SqliteDriver::new(), path);
            let error = client
                .find_all("t")
                .await
                .expect_err("The database cannot be opened");
            let message = format!("{:#}", error);
            assert!(message.contains("unable to open database file"));
            assert_eq!(message.matches(path).count(), 1);
            assert!(!client.is_connected().await);
        }
    }

    #[tokio::test]
    async fn multiple_statements() {
        init_logs();
        let mut connection = SqliteConnection::open(MEMORY)
            .await
            .expect("Could not open the database");
        let affected = connection
            .execute(
                "CREATE TABLE a (v INTEGER); INSERT INTO a VALUES (1), (2); INSERT INTO a VALUES (3);"
                    .into(),
            )
            .await
            .expect("Failed to run the statements");
        assert_eq!(affected.rows_affected, 3);
        assert_eq!(affected.last_affected_id, Some(3));
        let rows = connection
            .fetch("SELECT v, v * 0.5, 'x' || v, x'CAFE', NULL FROM a WHERE v = 2".into())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(rows.len(), 1);
        let row = rows.into_iter().next().unwrap().expect("Failed to fetch");
        assert_eq!(
            row.values(),
            [
                Value::Integer(2),
                Value::Real(1.0),
                Value::Text("x2".into()),
                Value::Blob([0xCA, 0xFE].into()),
                Value::Null,
            ]
        );
        connection.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn file_database_reopens_per_burst() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/bursts.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let client = Client::open(SqliteDriver::new(), DB_PATH);
        let columns: Record<String> = record! { "payload" => "BLOB" };
        let create = client.create("bursts", columns);
        let insert = client.emplace("bursts", record! { "payload" => vec![1u8, 2, 3] });
        create.await.expect("Failed to create");
        insert.await.expect("Failed to insert");
        assert!(!client.is_connected().await);
        assert_eq!(client.connections_opened().await, 1);

        // Data survives the close
        let cursor = client.find_all("bursts").await.expect("Failed to find");
        assert_eq!(cursor.len(), 1);
        assert_eq!(
            cursor.get(0).and_then(|v| v.get_column("payload")),
            Some(&Value::Blob([1, 2, 3].into()))
        );
        assert!(!client.is_connected().await);
        assert_eq!(client.connections_opened().await, 2);
    }

    #[tokio::test]
    async fn memory_url_keeps_its_data() {
        init_logs();
        for target in ["sqlite://:memory:", "file::memory:", "sqlite://kept?mode=memory"] {
            let client = Client::open(SqliteDriver::new(), target);
            assert_eq!(client.persistence(), Persistence::Permanent, "{}", target);
            let columns: Record<String> = record! { "v" => "INTEGER" };
            client.create("m", columns).await.expect("Failed to create");
            // A later burst still sees the table
            client
                .emplace("m", record! { "v" => 1 })
                .await
                .expect("The in-memory table should survive between bursts");
            let cursor = client.find_all("m").await.expect("Failed to find");
            assert_eq!(cursor.len(), 1);
            assert!(client.is_connected().await);
            assert_eq!(client.connections_opened().await, 1);
        }
    }
}
