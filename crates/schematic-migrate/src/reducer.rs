//! Removal of operations made moot by broader ones.

use std::collections::HashSet;

use schematic_core::{Identifier, IdentifierDefaults};

use crate::operations::MigrationOperation;

/// Removes duplicate operations and drops implied by a table drop.
///
/// Input order is preserved. When a table is dropped, drops of its columns,
/// keys, indexes, checks and triggers are removed, except foreign key drops
/// whose parent is another table dropped in the same batch: that parent's
/// drop depends on them. Renames are never removed. Table names are
/// compared once qualified with `defaults`.
#[must_use]
pub fn reduce(
    operations: Vec<MigrationOperation>,
    defaults: &IdentifierDefaults,
) -> Vec<MigrationOperation> {
    let mut seen = HashSet::with_capacity(operations.len());
    let unique: Vec<MigrationOperation> = operations
        .into_iter()
        .filter(|op| seen.insert(op.clone()))
        .collect();

    let dropped_tables: HashSet<Identifier> = unique
        .iter()
        .filter_map(|op| match op {
            MigrationOperation::DropTable { table } => Some(table.name.qualify(defaults)),
            _ => None,
        })
        .collect();

    if dropped_tables.is_empty() {
        return unique;
    }

    let moot: Vec<bool> = unique
        .iter()
        .map(|op| is_moot(op, &dropped_tables, defaults))
        .collect();
    let removed = moot.iter().filter(|m| **m).count();
    if removed > 0 {
        tracing::debug!(removed, "Reduced operations scoped to dropped tables");
    }

    unique
        .into_iter()
        .zip(moot)
        .filter_map(|(op, moot)| (!moot).then_some(op))
        .collect()
}

fn is_moot(
    op: &MigrationOperation,
    dropped_tables: &HashSet<Identifier>,
    defaults: &IdentifierDefaults,
) -> bool {
    match op {
        MigrationOperation::DropForeignKey { foreign_key } => {
            let child = foreign_key.child_table.qualify(defaults);
            let parent = foreign_key.parent_table.qualify(defaults);
            dropped_tables.contains(&child)
                && (child == parent || !dropped_tables.contains(&parent))
        }
        MigrationOperation::DropIndex { table, .. }
        | MigrationOperation::DropUniqueKey { table, .. }
        | MigrationOperation::DropPrimaryKey { table, .. }
        | MigrationOperation::DropTrigger { table, .. }
        | MigrationOperation::DropCheck { table, .. }
        | MigrationOperation::DropColumn { table, .. } => {
            dropped_tables.contains(&table.qualify(defaults))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schematic_core::{
        Column, DataType, DatabaseIndex, DatabaseKey, RelationalKey, Table, Trigger,
        TriggerEvent, TriggerTiming,
    };

    fn fk(child: &str, parent: &str) -> RelationalKey {
        RelationalKey::new(
            child,
            DatabaseKey::foreign(["parent_id"]).named(format!("fk_{child}_{parent}")),
            parent,
            DatabaseKey::primary(["id"]),
        )
    }

    fn table(name: &str) -> Table {
        Table::new(name).column(Column::new("id", DataType::new("integer")))
    }

    #[test]
    fn test_duplicates_removed_keeping_first() {
        let a = MigrationOperation::sql("SELECT 1");
        let b = MigrationOperation::sql("SELECT 2");
        assert_eq!(
            reduce(
                vec![a.clone(), b.clone(), a.clone()],
                &IdentifierDefaults::new()
            ),
            vec![a, b]
        );
    }

    #[test]
    fn test_drops_scoped_to_dropped_table_removed() {
        let name = Identifier::new("logs");
        let ops = vec![
            MigrationOperation::DropTrigger {
                table: name.clone(),
                trigger: Trigger::new(
                    "tr",
                    "BEGIN END",
                    TriggerTiming::After,
                    [TriggerEvent::Insert],
                ),
            },
            MigrationOperation::DropIndex {
                table: name.clone(),
                index: DatabaseIndex::new("ix_logs", ["id"]),
            },
            MigrationOperation::DropColumn {
                table: name.clone(),
                column: Column::new("id", DataType::new("integer")),
            },
            MigrationOperation::DropTable { table: table("logs") },
        ];

        assert_eq!(
            reduce(ops, &IdentifierDefaults::new()),
            vec![MigrationOperation::DropTable { table: table("logs") }]
        );
    }

    #[test]
    fn test_unrelated_drops_kept() {
        let ops = vec![
            MigrationOperation::DropIndex {
                table: Identifier::new("users"),
                index: DatabaseIndex::new("ix_users", ["id"]),
            },
            MigrationOperation::DropTable { table: table("logs") },
        ];
        assert_eq!(reduce(ops.clone(), &IdentifierDefaults::new()), ops);
    }

    #[test]
    fn test_foreign_key_to_other_dropped_table_kept() {
        let keep = MigrationOperation::DropForeignKey {
            foreign_key: fk("child", "parent"),
        };
        let moot = MigrationOperation::DropForeignKey {
            foreign_key: fk("child", "users"),
        };
        let ops = vec![
            keep.clone(),
            moot,
            MigrationOperation::DropTable { table: table("child") },
            MigrationOperation::DropTable { table: table("parent") },
        ];

        assert_eq!(
            reduce(ops, &IdentifierDefaults::new()),
            vec![
                keep,
                MigrationOperation::DropTable { table: table("child") },
                MigrationOperation::DropTable { table: table("parent") },
            ]
        );
    }

    #[test]
    fn test_self_reference_removed() {
        let ops = vec![
            MigrationOperation::DropForeignKey {
                foreign_key: fk("tree", "tree"),
            },
            MigrationOperation::DropTable { table: table("tree") },
        ];
        assert_eq!(reduce(ops, &IdentifierDefaults::new()).len(), 1);
    }

    #[test]
    fn test_renames_never_removed() {
        let ops = vec![
            MigrationOperation::RenameIndex {
                table: Identifier::new("logs"),
                index: DatabaseIndex::new("ix_a", ["id"]),
                new_name: Identifier::new("ix_b"),
            },
            MigrationOperation::DropTable { table: table("logs") },
        ];
        assert_eq!(reduce(ops.clone(), &IdentifierDefaults::new()), ops);
    }

    #[test]
    fn test_foreign_key_to_differently_spelled_parent_kept() {
        let defaults = IdentifierDefaults::new().schema("dbo");
        let drop_fk = MigrationOperation::DropForeignKey {
            foreign_key: RelationalKey {
                parent_table: Identifier::with_schema("dbo", "users"),
                ..fk("orders", "users")
            },
        };
        let ops = vec![
            drop_fk.clone(),
            MigrationOperation::DropIndex {
                table: Identifier::with_schema("dbo", "orders"),
                index: DatabaseIndex::new("ix_orders", ["id"]),
            },
            MigrationOperation::DropTable { table: table("orders") },
            MigrationOperation::DropTable { table: table("users") },
        ];

        assert_eq!(
            reduce(ops, &defaults),
            vec![
                drop_fk,
                MigrationOperation::DropTable { table: table("orders") },
                MigrationOperation::DropTable { table: table("users") },
            ]
        );
    }
}
