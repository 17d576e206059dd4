use crate::silent_logs;
use sqlq::{Client, Driver, Record, Value, record};

pub async fn crud<D: Driver>(client: &Client<D>) {
    // Setup
    let columns: Record<String> = record! {
        "from" => "TEXT",
        "to" => "TEXT",
        "amount" => "REAL",
        "contract" => "TEXT",
        "memo" => "TEXT",
        "date" => "NUMERIC",
        "nonce" => "INTEGER",
        "default" => "INTEGER DEFAULT 123",
    };
    let cursor = client
        .create("transfers", columns)
        .await
        .expect("Failed to create the transfers table");
    assert_eq!(cursor.len(), 0);
    assert_eq!(cursor.table(), "transfers");

    // Insert
    for nonce in 1..=5 {
        let cursor = client
            .emplace(
                "transfers",
                record! {
                    "from" => "alice",
                    "to" => "bob",
                    "amount" => 1.2345,
                    "memo" => "",
                    "nonce" => nonce,
                },
            )
            .await
            .expect("Failed to insert a transfer");
        assert_eq!(cursor.len(), 0);
    }

    // Find by row identifier
    let cursor = client
        .find("transfers", 2)
        .await
        .expect("Failed to find by rowid");
    assert_eq!(cursor.len(), 1);
    let row = cursor.get(0).expect("Row 2 should exist");
    assert_eq!(row.rowid(), Some(2));
    assert_eq!(row.get_column("nonce"), Some(&Value::Integer(2)));
    assert_eq!(row.get_column("amount"), Some(&Value::Real(1.2345)));
    assert_eq!(row.get_column("memo"), Some(&Value::Text("".into())));
    assert_eq!(row.get_column("contract"), Some(&Value::Null));
    assert_eq!(row.get_column("default"), Some(&Value::Integer(123)));

    // Find by predicate
    let cursor = client
        .find("transfers", record! { "nonce" => 4 })
        .await
        .expect("Failed to find nonce 4");
    assert_eq!(cursor.len(), 1);
    assert_eq!(
        cursor.get(0).and_then(|v| v.get_column("nonce")),
        Some(&Value::Integer(4))
    );
    let cursor = client
        .find("transfers", record! { "from" => "alice", "to" => "bob" })
        .await
        .expect("Failed to find the transfers from alice to bob");
    assert_eq!(cursor.len(), 5);
    let cursor = client
        .find("transfers", record! { "from" => "nobody" })
        .await
        .expect("Failed to find a missing sender");
    assert_eq!(cursor.len(), 0);
    let cursor = client
        .find("transfers", record! { "contract" => None::<String> })
        .await
        .expect("Failed to find the transfers without a contract");
    assert_eq!(cursor.len(), 5);

    // Remove
    let cursor = client
        .remove("transfers", record! { "nonce" => 1 })
        .await
        .expect("Failed to remove nonce 1");
    assert_eq!(cursor.len(), 0);
    let cursor = client
        .find_all("transfers")
        .await
        .expect("Failed to find all the transfers");
    assert_eq!(cursor.len(), 4);

    // Remove through a cursor
    let cursor = client
        .find("transfers", record! { "from" => "alice" })
        .await
        .expect("Failed to find the transfers from alice");
    let removed = cursor.get(0).cloned().expect("There should be a first row");
    let result = cursor
        .remove(0)
        .await
        .expect("Failed to remove the first transfer found");
    assert_eq!(result.len(), 0);
    let cursor = client
        .find_all("transfers")
        .await
        .expect("Failed to find all the transfers");
    assert_eq!(cursor.len(), 3);
    let cursor = client
        .find("transfers", Record::from(&removed))
        .await
        .expect("Failed to find the removed transfer");
    assert!(cursor.is_empty());

    // Update
    let cursor = client
        .update(
            "transfers",
            record! { "from" => "alice" },
            record! { "from" => "carol" },
        )
        .await
        .expect("Failed to update the sender");
    assert_eq!(cursor.len(), 0);
    let cursor = client
        .find_all("transfers")
        .await
        .expect("Failed to find all the transfers");
    assert_eq!(cursor.len(), 3);
    for row in cursor {
        assert_eq!(row.get_column("from"), Some(&Value::Text("carol".into())));
    }

    // Update through a cursor
    let cursor = client
        .find("transfers", record! { "to" => "bob" })
        .await
        .expect("Failed to find the transfers to bob");
    let result = cursor
        .update(0, record! { "to" => "dave" })
        .await
        .expect("Failed to update the first transfer found");
    assert_eq!(result.len(), 0);
    let cursor = client
        .find("transfers", record! { "to" => "dave" })
        .await
        .expect("Failed to find the transfers to dave");
    assert_eq!(cursor.len(), 1);
}

pub async fn rowid_is_reserved<D: Driver>(client: &Client<D>) {
    let columns: Record<String> = record! { "rowid" => "INTEGER", "memo" => "TEXT" };
    silent_logs! {
        let result = client.create("reserved", columns).await;
        assert!(result.is_err(), "A rowid column should be rejected");
        // The table was never created
        assert!(client.find_all("reserved").await.is_err());
    }
}

pub async fn integer_primary_key<D: Driver>(client: &Client<D>) {
    let columns: Record<String> = record! { "id" => "INTEGER PRIMARY KEY", "name" => "TEXT" };
    client
        .create("accounts", columns)
        .await
        .expect("Failed to create the accounts table");
    for name in ["alice", "bob"] {
        client
            .emplace("accounts", record! { "name" => name })
            .await
            .expect("Failed to insert an account");
    }

    // The primary key aliases the row identifier, both keep their own label
    let cursor = client
        .find("accounts", 2)
        .await
        .expect("Failed to find by rowid");
    assert_eq!(cursor.len(), 1);
    let row = cursor.get(0).expect("Row 2 should exist");
    assert_eq!(row.names(), ["rowid", "id", "name"]);
    assert_eq!(row.rowid(), Some(2));
    assert_eq!(row.get_column("id"), Some(&Value::Integer(2)));
    assert_eq!(row.get_column("name"), Some(&Value::Text("bob".into())));

    let result = cursor.remove(0).await.expect("Failed to remove bob");
    assert_eq!(result.len(), 0);
    let cursor = client
        .find_all("accounts")
        .await
        .expect("Failed to find the accounts");
    assert_eq!(cursor.len(), 1);
    assert_eq!(cursor.get(0).and_then(|v| v.rowid()), Some(1));
}
