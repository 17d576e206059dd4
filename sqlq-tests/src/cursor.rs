use sqlq::{Client, Driver, Record, Value, record};

async fn setup<D: Driver>(client: &Client<D>, table: &str, rows: i32) {
    let columns: Record<String> = record! { "label" => "TEXT", "position" => "INTEGER" };
    client
        .create(table, columns)
        .await
        .expect("Failed to create the table");
    let mut pending = Vec::new();
    for i in 0..rows {
        pending.push(client.emplace(
            table,
            record! { "label" => format!("item {}", i), "position" => i },
        ));
    }
    for p in pending {
        p.await.expect("Failed to insert the row");
    }
}

pub async fn cursor_stepping<D: Driver>(client: &Client<D>) {
    setup(client, "stepping", 4).await;
    let mut cursor = client
        .find_all("stepping")
        .await
        .expect("Failed to find the rows");
    assert_eq!(cursor.len(), 4);

    let mut forward = Vec::new();
    loop {
        let step = cursor.step_forward();
        if step.done {
            break;
        }
        assert!(step.remove_action().is_some());
        let row = step.value.expect("A step not done carries a row");
        forward.push(row.get_column("position").and_then(Value::as_i64));
    }
    assert_eq!(forward, [Some(0), Some(1), Some(2), Some(3)]);

    let mut backward = Vec::new();
    loop {
        let step = cursor.step_back();
        if step.done {
            break;
        }
        let row = step.value.expect("A step not done carries a row");
        backward.push(row.get_column("position").and_then(Value::as_i64));
    }
    assert_eq!(backward, [Some(3), Some(2), Some(1), Some(0)]);

    let step = cursor.reset();
    assert!(!step.done);
    assert!(step.remove_action().is_none());
    assert_eq!(
        step.value.and_then(|v| v.get_column("label").cloned()),
        Some(Value::Text("item 0".into()))
    );
    let identifiers = cursor
        .all_data()
        .iter()
        .filter_map(|v| v.rowid())
        .collect::<Vec<_>>();
    assert_eq!(identifiers.len(), 4);
    assert!(identifiers.windows(2).all(|v| v[0] < v[1]));
}

pub async fn cursor_mutations<D: Driver>(client: &Client<D>) {
    setup(client, "mutations", 5).await;
    let mut cursor = client
        .find_all("mutations")
        .await
        .expect("Failed to find the rows");
    assert_eq!(cursor.len(), 5);

    // Remove action from a step
    let step = cursor.step_forward();
    let action = step
        .into_remove_action()
        .expect("A yielded row has a remove action");
    let cursor_after = client.find_all("mutations");
    action
        .run()
        .await
        .expect("Failed to remove the stepped row");
    // Queued before the removal, so it still sees every row
    assert_eq!(cursor_after.await.expect("Failed to find").len(), 5);
    assert_eq!(
        client
            .find_all("mutations")
            .await
            .expect("Failed to find")
            .len(),
        4
    );

    // Update and remove by index on the snapshot, which does not change
    cursor
        .update(1, record! { "label" => "updated" })
        .await
        .expect("Failed to update the row");
    cursor.remove(2).await.expect("Failed to remove the row");
    assert_eq!(cursor.len(), 5);
    let updated = client
        .find("mutations", record! { "label" => "updated" })
        .await
        .expect("Failed to find the updated row");
    assert_eq!(updated.len(), 1);
    assert_eq!(
        updated.get(0).and_then(|v| v.rowid()),
        cursor.get(1).and_then(|v| v.rowid())
    );
    let remaining = client
        .find_all("mutations")
        .await
        .expect("Failed to find the rows");
    assert_eq!(remaining.len(), 3);

    // The updated row no longer matches its old values
    cursor
        .remove(1)
        .await
        .expect("Removing a stale row is not an error");
    assert_eq!(
        client
            .find_all("mutations")
            .await
            .expect("Failed to find")
            .len(),
        3
    );
}
