use crate::silent_logs;
use sqlq::{Client, Driver, Record, Value, record};

pub async fn issue_order<D: Driver>(client: &Client<D>) {
    let columns: Record<String> = record! { "value" => "INTEGER" };
    let create = client.create("ordering", columns);
    let mut inserts = Vec::new();
    for i in 0..50 {
        inserts.push(client.emplace("ordering", record! { "value" => i }));
    }
    // Issued last, awaited first: it must still see every insert above
    let find = client.find_all("ordering");
    let cursor = find.await.expect("Failed to find the rows");
    assert_eq!(cursor.len(), 50);
    let values = cursor
        .map(|row| row.get_column("value").and_then(Value::as_i64))
        .collect::<Vec<_>>();
    assert_eq!(values, (0..50).map(Some).collect::<Vec<_>>());
    create.await.expect("Failed to create the table");
    for insert in inserts {
        insert.await.expect("Failed to insert the row");
    }

    // Interleaved mutations observe each other in issue order
    let removed = client.remove("ordering", record! { "value" => 10 });
    let updated = client.update(
        "ordering",
        record! { "value" => 11 },
        record! { "value" => 10 },
    );
    let found = client.find("ordering", record! { "value" => 10 });
    removed.await.expect("Failed to remove");
    updated.await.expect("Failed to update");
    assert_eq!(found.await.expect("Failed to find").len(), 1);
    let cursor = client
        .find("ordering", record! { "value" => 11 })
        .await
        .expect("Failed to find");
    assert!(cursor.is_empty());
}

pub async fn failure_does_not_block<D: Driver>(client: &Client<D>) {
    let columns: Record<String> = record! { "value" => "INTEGER" };
    client
        .create("failures", columns)
        .await
        .expect("Failed to create the table");
    silent_logs! {
        let before = client.emplace("failures", record! { "value" => 1 });
        let failing = client.emplace("missing_table", record! { "value" => "only once" });
        let after = client.emplace("failures", record! { "value" => 3 });
        let find = client.find_all("failures");
        before.await.expect("The statement before the failure should succeed");
        let error = failing.await.expect_err("Inserting into a missing table should fail");
        let message = format!("{:#}", error);
        assert!(message.contains("missing_table"));
        // The statement is quoted by a single context layer
        assert_eq!(message.matches("only once").count(), 1);
        after.await.expect("The statement after the failure should succeed");
        assert_eq!(find.await.expect("Failed to find").len(), 2);
    }
}
