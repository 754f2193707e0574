//! Integration tests for reading schema models from JSON.
//!
//! Schema providers and snapshot files describe tables in JSON, usually with
//! most optional members left out. These tests pin down the defaults.

use schematic_core::{
    Column, DataType, DatabaseKey, Identifier, KeyType, ReferentialAction, RelationalKey, Table,
    TriggerEvent, TriggerTiming,
};

// =============================================================================
// Minimal documents
// =============================================================================

#[test]
fn test_table_with_only_columns() {
    let table: Table = serde_json::from_str(
        r#"{
            "name": { "schema": "dbo", "local_name": "users" },
            "columns": [
                { "name": { "local_name": "id" }, "data_type": { "name": "integer" }, "is_nullable": false },
                { "name": { "local_name": "bio" }, "data_type": { "name": "varchar", "max_length": 500 }, "is_nullable": true }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(table.name, Identifier::with_schema("dbo", "users"));
    assert_eq!(table.columns.len(), 2);
    assert_eq!(
        table.get_column("bio").unwrap().data_type,
        DataType::with_length("varchar", 500)
    );
    assert!(table.primary_key.is_none());
    assert!(table.parent_keys.is_empty());
    assert!(table.indexes.is_empty());
}

#[test]
fn test_constraints_default_to_enabled() {
    let table: Table = serde_json::from_str(
        r#"{
            "name": { "local_name": "orders" },
            "columns": [
                { "name": { "local_name": "user_id" }, "data_type": { "name": "integer" }, "is_nullable": true }
            ],
            "primary_key": { "key_type": "Primary", "columns": ["user_id"] },
            "parent_keys": [{
                "child_table": { "local_name": "orders" },
                "child_key": { "name": { "local_name": "fk_orders_users" }, "key_type": "Foreign", "columns": ["user_id"] },
                "parent_table": { "local_name": "users" },
                "parent_key": { "key_type": "Primary", "columns": ["id"] }
            }],
            "indexes": [{ "name": { "local_name": "ix_orders_user" }, "columns": [{ "expression": "user_id", "dependent_columns": ["user_id"] }] }],
            "triggers": [{
                "name": { "local_name": "trg_orders" },
                "definition": "SELECT 1",
                "timing": "After",
                "events": ["Insert", "Update"]
            }]
        }"#,
    )
    .unwrap();

    let pk = table.primary_key.as_ref().unwrap();
    assert_eq!(pk.key_type, KeyType::Primary);
    assert!(pk.is_enabled);

    let fk = &table.parent_keys[0];
    assert_eq!(fk.delete_action, ReferentialAction::NoAction);
    assert_eq!(fk.update_action, ReferentialAction::NoAction);
    assert_eq!(fk.name(), Some(&Identifier::new("fk_orders_users")));
    assert!(fk.child_key.is_enabled);

    let index = &table.indexes[0];
    assert!(index.is_enabled);
    assert!(!index.is_unique);
    assert_eq!(index.referenced_columns().collect::<Vec<_>>(), vec!["user_id"]);

    let trigger = &table.triggers[0];
    assert_eq!(trigger.timing, TriggerTiming::After);
    assert!(trigger.events.contains(&TriggerEvent::Update));
    assert!(trigger.is_enabled);
}

// =============================================================================
// Builders and serialization agree
// =============================================================================

#[test]
fn test_built_table_survives_serialization() {
    let table = Table::new("orders")
        .column(Column::new("id", DataType::new("integer")).not_null())
        .column(Column::new("user_id", DataType::new("integer")))
        .primary_key(DatabaseKey::primary(["id"]).named("pk_orders"))
        .foreign_key(
            RelationalKey::new(
                "ignored",
                DatabaseKey::foreign(["user_id"]),
                "users",
                DatabaseKey::primary(["id"]),
            )
            .on_delete(ReferentialAction::Cascade),
        );

    let json = serde_json::to_string(&table).unwrap();
    assert!(!json.contains("ignored"));

    let read: Table = serde_json::from_str(&json).unwrap();
    assert_eq!(read, table);
    assert_eq!(read.parent_keys[0].child_table, Identifier::new("orders"));
}
