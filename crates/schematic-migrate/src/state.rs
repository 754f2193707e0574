//! Schema reconstruction by replaying operations.
//!
//! [`SchemaState`] applies migration operations to an in-memory snapshot.
//! Replaying the output of a diff against the existing schema must produce
//! a schema that compares equal to the target; the integration tests rely on
//! this to check the differ end to end.

use std::fmt::Display;

use tracing::debug;

use schematic_core::{
    CheckConstraint, DatabaseIndex, DatabaseKey, Identifier, IdentifierDefaults, RelationalKey,
    Table,
};

use crate::database::SchemaSnapshot;
use crate::error::{MigrateError, Result};
use crate::operations::MigrationOperation;

/// A schema built up by applying operations.
#[derive(Debug, Clone, Default)]
pub struct SchemaState {
    snapshot: SchemaSnapshot,
}

impl SchemaState {
    /// Creates an empty schema state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing snapshot.
    #[must_use]
    pub const fn from_snapshot(snapshot: SchemaSnapshot) -> Self {
        Self { snapshot }
    }

    /// Returns the current schema.
    #[must_use]
    pub const fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    /// Consumes and returns the schema.
    #[must_use]
    pub fn into_snapshot(self) -> SchemaSnapshot {
        self.snapshot
    }

    /// Applies operations in order, stopping at the first failure.
    pub fn apply_all(&mut self, operations: &[MigrationOperation]) -> Result<()> {
        for operation in operations {
            self.apply_operation(operation)?;
        }
        Ok(())
    }

    /// Applies a single operation.
    ///
    /// Objects are located by name, qualified with the snapshot's identifier
    /// defaults. Constraints without a name are located by content. Creating
    /// an object that already exists, or touching one that does not, fails
    /// with [`MigrateError::InvalidState`].
    pub fn apply_operation(&mut self, operation: &MigrationOperation) -> Result<()> {
        let defaults = self.snapshot.identifier_defaults.clone();
        let defaults = &defaults;
        let snapshot = &mut self.snapshot;

        match operation {
            MigrationOperation::CreateTable { table } => {
                if snapshot.get_table(&table.name).is_some() {
                    return Err(already_exists("Table", &table.name));
                }
                snapshot.tables.push(table.clone());
            }

            MigrationOperation::DropTable { table } => {
                remove_where(&mut snapshot.tables, |t| {
                    t.name.same_object(&table.name, defaults)
                })
                .ok_or_else(|| not_found("Table", &table.name))?;
            }

            MigrationOperation::RenameTable { table, new_name } => {
                if snapshot.get_table(new_name).is_some() {
                    return Err(already_exists("Table", new_name));
                }
                table_mut(&mut snapshot.tables, &table.name, defaults)?.name = new_name.clone();

                for fk in snapshot.tables.iter_mut().flat_map(|t| &mut t.parent_keys) {
                    if fk.parent_table.same_object(&table.name, defaults) {
                        fk.parent_table = new_name.clone();
                    }
                    if fk.child_table.same_object(&table.name, defaults) {
                        fk.child_table = new_name.clone();
                    }
                }
            }

            MigrationOperation::AddColumn { table, column } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if column_position(t, &column.name, defaults).is_some() {
                    return Err(already_exists_in("Column", &column.name, table));
                }
                t.columns.push(column.clone());
            }

            MigrationOperation::DropColumn { table, column } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                let idx = column_position(t, &column.name, defaults)
                    .ok_or_else(|| not_found_in("Column", &column.name, table))?;
                t.columns.remove(idx);
            }

            MigrationOperation::AlterColumn {
                table,
                existing,
                target,
            } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                let idx = column_position(t, &existing.name, defaults)
                    .ok_or_else(|| not_found_in("Column", &existing.name, table))?;
                t.columns[idx] = target.clone();
            }

            MigrationOperation::RenameColumn {
                table,
                column,
                new_name,
            } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if column_position(t, new_name, defaults).is_some() {
                    return Err(already_exists_in("Column", new_name, table));
                }
                let idx = column_position(t, &column.name, defaults)
                    .ok_or_else(|| not_found_in("Column", &column.name, table))?;
                let old = t.columns[idx].local_name().to_string();
                let new = new_name.local_name().to_string();
                t.columns[idx].name = new_name.clone();
                rename_table_columns(t, &old, &new);

                for fk in snapshot.tables.iter_mut().flat_map(|t| &mut t.parent_keys) {
                    if fk.parent_table.same_object(table, defaults) {
                        rename_in(&mut fk.parent_key.columns, &old, &new);
                    }
                }
            }

            MigrationOperation::AddPrimaryKey { table, key } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if let Some(current) = &t.primary_key {
                    return Err(already_exists_in("Primary key", key_label(current), table));
                }
                t.primary_key = Some(key.clone());
            }

            MigrationOperation::DropPrimaryKey { table, key } => {
                table_mut(&mut snapshot.tables, table, defaults)?
                    .primary_key
                    .take()
                    .ok_or_else(|| not_found_in("Primary key", key_label(key), table))?;
            }

            MigrationOperation::RenamePrimaryKey {
                table,
                key,
                new_name,
            } => {
                table_mut(&mut snapshot.tables, table, defaults)?
                    .primary_key
                    .as_mut()
                    .ok_or_else(|| not_found_in("Primary key", key_label(key), table))?
                    .name = Some(new_name.clone());
            }

            MigrationOperation::AddUniqueKey { table, key } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if t.unique_keys.iter().any(|k| same_key(k, key, defaults)) {
                    return Err(already_exists_in("Unique key", key_label(key), table));
                }
                t.unique_keys.push(key.clone());
            }

            MigrationOperation::DropUniqueKey { table, key } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                remove_where(&mut t.unique_keys, |k| same_key(k, key, defaults))
                    .ok_or_else(|| not_found_in("Unique key", key_label(key), table))?;
            }

            MigrationOperation::RenameUniqueKey {
                table,
                key,
                new_name,
            } => {
                table_mut(&mut snapshot.tables, table, defaults)?
                    .unique_keys
                    .iter_mut()
                    .find(|k| same_key(k, key, defaults))
                    .ok_or_else(|| not_found_in("Unique key", key_label(key), table))?
                    .name = Some(new_name.clone());
            }

            MigrationOperation::AddForeignKey { foreign_key } => {
                let table = &foreign_key.child_table;
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if t
                    .parent_keys
                    .iter()
                    .any(|fk| same_relationship(fk, foreign_key, defaults))
                {
                    return Err(already_exists_in(
                        "Foreign key",
                        key_label(&foreign_key.child_key),
                        table,
                    ));
                }
                t.parent_keys.push(foreign_key.clone());
            }

            MigrationOperation::DropForeignKey { foreign_key } => {
                let table = &foreign_key.child_table;
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                remove_where(&mut t.parent_keys, |fk| {
                    same_relationship(fk, foreign_key, defaults)
                })
                .ok_or_else(|| {
                    not_found_in("Foreign key", key_label(&foreign_key.child_key), table)
                })?;
            }

            MigrationOperation::RenameForeignKey {
                foreign_key,
                new_name,
            } => {
                let table = &foreign_key.child_table;
                table_mut(&mut snapshot.tables, table, defaults)?
                    .parent_keys
                    .iter_mut()
                    .find(|fk| same_relationship(fk, foreign_key, defaults))
                    .ok_or_else(|| {
                        not_found_in("Foreign key", key_label(&foreign_key.child_key), table)
                    })?
                    .child_key
                    .name = Some(new_name.clone());
            }

            MigrationOperation::CreateIndex { table, index } => {
                let indexes = indexes_mut(snapshot, table, defaults)?;
                if index_position(indexes, &index.name, defaults).is_some() {
                    return Err(already_exists_in("Index", &index.name, table));
                }
                indexes.push(index.clone());
            }

            MigrationOperation::DropIndex { table, index } => {
                let indexes = indexes_mut(snapshot, table, defaults)?;
                let idx = index_position(indexes, &index.name, defaults)
                    .ok_or_else(|| not_found_in("Index", &index.name, table))?;
                indexes.remove(idx);
            }

            MigrationOperation::RenameIndex {
                table,
                index,
                new_name,
            } => {
                let indexes = indexes_mut(snapshot, table, defaults)?;
                if index_position(indexes, new_name, defaults).is_some() {
                    return Err(already_exists_in("Index", new_name, table));
                }
                let idx = index_position(indexes, &index.name, defaults)
                    .ok_or_else(|| not_found_in("Index", &index.name, table))?;
                indexes[idx].name = new_name.clone();
            }

            MigrationOperation::AddCheck { table, check } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if t.checks.iter().any(|c| same_check(c, check, defaults)) {
                    return Err(already_exists_in("Check constraint", check_label(check), table));
                }
                t.checks.push(check.clone());
            }

            MigrationOperation::DropCheck { table, check } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                remove_where(&mut t.checks, |c| same_check(c, check, defaults))
                    .ok_or_else(|| not_found_in("Check constraint", check_label(check), table))?;
            }

            MigrationOperation::RenameCheck {
                table,
                check,
                new_name,
            } => {
                table_mut(&mut snapshot.tables, table, defaults)?
                    .checks
                    .iter_mut()
                    .find(|c| same_check(c, check, defaults))
                    .ok_or_else(|| not_found_in("Check constraint", check_label(check), table))?
                    .name = Some(new_name.clone());
            }

            MigrationOperation::AddTrigger { table, trigger } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                if t
                    .triggers
                    .iter()
                    .any(|tr| tr.name.same_object(&trigger.name, defaults))
                {
                    return Err(already_exists_in("Trigger", &trigger.name, table));
                }
                t.triggers.push(trigger.clone());
            }

            MigrationOperation::DropTrigger { table, trigger } => {
                let t = table_mut(&mut snapshot.tables, table, defaults)?;
                remove_where(&mut t.triggers, |tr| {
                    tr.name.same_object(&trigger.name, defaults)
                })
                .ok_or_else(|| not_found_in("Trigger", &trigger.name, table))?;
            }

            MigrationOperation::CreateView { view } => {
                if snapshot.get_view(&view.name).is_some() {
                    return Err(already_exists("View", &view.name));
                }
                snapshot.views.push(view.clone());
            }

            MigrationOperation::DropView { view } => {
                remove_where(&mut snapshot.views, |v| {
                    v.name.same_object(&view.name, defaults)
                })
                .ok_or_else(|| not_found("View", &view.name))?;
            }

            MigrationOperation::CreateSequence { sequence } => {
                if snapshot
                    .sequences
                    .iter()
                    .any(|s| s.name.same_object(&sequence.name, defaults))
                {
                    return Err(already_exists("Sequence", &sequence.name));
                }
                snapshot.sequences.push(sequence.clone());
            }

            MigrationOperation::DropSequence { sequence } => {
                remove_where(&mut snapshot.sequences, |s| {
                    s.name.same_object(&sequence.name, defaults)
                })
                .ok_or_else(|| not_found("Sequence", &sequence.name))?;
            }

            MigrationOperation::AlterSequence { existing, target } => {
                let current = snapshot
                    .sequences
                    .iter_mut()
                    .find(|s| s.name.same_object(&existing.name, defaults))
                    .ok_or_else(|| not_found("Sequence", &existing.name))?;
                *current = target.clone();
            }

            MigrationOperation::CreateSynonym { synonym } => {
                if snapshot
                    .synonyms
                    .iter()
                    .any(|s| s.name.same_object(&synonym.name, defaults))
                {
                    return Err(already_exists("Synonym", &synonym.name));
                }
                snapshot.synonyms.push(synonym.clone());
            }

            MigrationOperation::DropSynonym { synonym } => {
                remove_where(&mut snapshot.synonyms, |s| {
                    s.name.same_object(&synonym.name, defaults)
                })
                .ok_or_else(|| not_found("Synonym", &synonym.name))?;
            }

            MigrationOperation::CreateRoutine { routine } => {
                if snapshot
                    .routines
                    .iter()
                    .any(|r| r.name.same_object(&routine.name, defaults))
                {
                    return Err(already_exists("Routine", &routine.name));
                }
                snapshot.routines.push(routine.clone());
            }

            MigrationOperation::DropRoutine { routine } => {
                remove_where(&mut snapshot.routines, |r| {
                    r.name.same_object(&routine.name, defaults)
                })
                .ok_or_else(|| not_found("Routine", &routine.name))?;
            }

            MigrationOperation::Sql { sql } => {
                debug!(sql = %sql, "Raw SQL does not change the tracked schema");
            }
        }

        Ok(())
    }
}

fn not_found(what: &str, name: impl Display) -> MigrateError {
    MigrateError::InvalidState(format!("{what} '{name}' does not exist"))
}

fn not_found_in(what: &str, name: impl Display, owner: &Identifier) -> MigrateError {
    MigrateError::InvalidState(format!("{what} '{name}' does not exist in '{owner}'"))
}

fn already_exists(what: &str, name: impl Display) -> MigrateError {
    MigrateError::InvalidState(format!("{what} '{name}' already exists"))
}

fn already_exists_in(what: &str, name: impl Display, owner: &Identifier) -> MigrateError {
    MigrateError::InvalidState(format!("{what} '{name}' already exists in '{owner}'"))
}

fn table_mut<'a>(
    tables: &'a mut [Table],
    name: &Identifier,
    defaults: &IdentifierDefaults,
) -> Result<&'a mut Table> {
    tables
        .iter_mut()
        .find(|t| t.name.same_object(name, defaults))
        .ok_or_else(|| not_found("Table", name))
}

/// Indexes of a table or, failing that, of a view.
fn indexes_mut<'a>(
    snapshot: &'a mut SchemaSnapshot,
    owner: &Identifier,
    defaults: &IdentifierDefaults,
) -> Result<&'a mut Vec<DatabaseIndex>> {
    if let Some(table) = snapshot
        .tables
        .iter_mut()
        .find(|t| t.name.same_object(owner, defaults))
    {
        return Ok(&mut table.indexes);
    }
    snapshot
        .views
        .iter_mut()
        .find(|v| v.name.same_object(owner, defaults))
        .map(|v| &mut v.indexes)
        .ok_or_else(|| not_found("Table or view", owner))
}

fn remove_where<E>(items: &mut Vec<E>, predicate: impl Fn(&E) -> bool) -> Option<E> {
    let idx = items.iter().position(predicate)?;
    Some(items.remove(idx))
}

fn column_position(
    table: &Table,
    name: &Identifier,
    defaults: &IdentifierDefaults,
) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| c.name.same_object(name, defaults))
}

fn index_position(
    indexes: &[DatabaseIndex],
    name: &Identifier,
    defaults: &IdentifierDefaults,
) -> Option<usize> {
    indexes
        .iter()
        .position(|i| i.name.same_object(name, defaults))
}

fn same_key(a: &DatabaseKey, b: &DatabaseKey, defaults: &IdentifierDefaults) -> bool {
    match (&a.name, &b.name) {
        (Some(x), Some(y)) => x.same_object(y, defaults),
        _ => a.columns == b.columns,
    }
}

fn same_relationship(a: &RelationalKey, b: &RelationalKey, defaults: &IdentifierDefaults) -> bool {
    match (a.name(), b.name()) {
        (Some(x), Some(y)) => x.same_object(y, defaults),
        _ => {
            a.child_key.columns == b.child_key.columns
                && a.parent_table.same_object(&b.parent_table, defaults)
                && a.parent_key.columns == b.parent_key.columns
        }
    }
}

fn same_check(a: &CheckConstraint, b: &CheckConstraint, defaults: &IdentifierDefaults) -> bool {
    match (&a.name, &b.name) {
        (Some(x), Some(y)) => x.same_object(y, defaults),
        _ => a.definition == b.definition,
    }
}

fn key_label(key: &DatabaseKey) -> String {
    key.name
        .as_ref()
        .map_or_else(|| format!("({})", key.columns.join(", ")), ToString::to_string)
}

fn check_label(check: &CheckConstraint) -> String {
    check
        .name
        .as_ref()
        .map_or_else(|| check.definition.clone(), ToString::to_string)
}

fn rename_in(columns: &mut [String], old: &str, new: &str) {
    for column in columns.iter_mut().filter(|c| c.as_str() == old) {
        *column = new.to_string();
    }
}

/// Follows a column rename through the keys and indexes of its table.
fn rename_table_columns(table: &mut Table, old: &str, new: &str) {
    if let Some(pk) = &mut table.primary_key {
        rename_in(&mut pk.columns, old, new);
    }
    for key in &mut table.unique_keys {
        rename_in(&mut key.columns, old, new);
    }
    for fk in &mut table.parent_keys {
        rename_in(&mut fk.child_key.columns, old, new);
    }
    for index in &mut table.indexes {
        for column in &mut index.columns {
            if column.expression == old {
                column.expression = new.to_string();
            }
            rename_in(&mut column.dependent_columns, old, new);
        }
        rename_in(&mut index.included_columns, old, new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematic_core::{Column, DataType, Sequence, View};

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", DataType::new("integer")).not_null())
            .column(Column::new("username", DataType::with_length("varchar", 255)).not_null())
            .primary_key(DatabaseKey::primary(["id"]))
            .index(DatabaseIndex::new("ix_users_username", ["username"]))
    }

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("user_id", DataType::new("integer")))
            .foreign_key(RelationalKey::new(
                "orders",
                DatabaseKey::foreign(["user_id"]).named("fk_orders_users"),
                "users",
                DatabaseKey::primary(["id"]),
            ))
    }

    fn state_with(tables: Vec<Table>) -> SchemaState {
        let mut state = SchemaState::new();
        for table in tables {
            state
                .apply_operation(&MigrationOperation::CreateTable { table })
                .unwrap();
        }
        state
    }

    #[test]
    fn test_create_table() {
        let state = state_with(vec![users()]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.tables.len(), 1);
        let users = snapshot.get_table(&Identifier::new("users")).unwrap();
        assert_eq!(users.columns.len(), 2);
        assert_eq!(users.primary_key.as_ref().unwrap().columns, vec!["id"]);
    }

    #[test]
    fn test_add_and_drop_column() {
        let mut state = state_with(vec![users()]);
        let email = Column::new("email", DataType::new("text"));

        state
            .apply_operation(&MigrationOperation::AddColumn {
                table: Identifier::new("users"),
                column: email.clone(),
            })
            .unwrap();
        assert!(state.snapshot().tables[0].get_column("email").is_some());

        state
            .apply_operation(&MigrationOperation::DropColumn {
                table: Identifier::new("users"),
                column: email,
            })
            .unwrap();
        assert!(state.snapshot().tables[0].get_column("email").is_none());
    }

    #[test]
    fn test_rename_table_follows_foreign_keys() {
        let mut state = state_with(vec![users(), orders()]);

        state
            .apply_operation(&MigrationOperation::RenameTable {
                table: users(),
                new_name: Identifier::new("accounts"),
            })
            .unwrap();

        let snapshot = state.snapshot();
        assert!(snapshot.get_table(&Identifier::new("users")).is_none());
        assert!(snapshot.get_table(&Identifier::new("accounts")).is_some());
        let orders = snapshot.get_table(&Identifier::new("orders")).unwrap();
        assert_eq!(orders.parent_keys[0].parent_table, Identifier::new("accounts"));
    }

    #[test]
    fn test_rename_column_follows_keys_and_indexes() {
        let mut state = state_with(vec![users(), orders()]);

        state
            .apply_operation(&MigrationOperation::RenameColumn {
                table: Identifier::new("users"),
                column: Column::new("id", DataType::new("integer")),
                new_name: Identifier::new("user_id"),
            })
            .unwrap();
        state
            .apply_operation(&MigrationOperation::RenameColumn {
                table: Identifier::new("users"),
                column: Column::new("username", DataType::new("text")),
                new_name: Identifier::new("login"),
            })
            .unwrap();

        let snapshot = state.snapshot();
        let users = snapshot.get_table(&Identifier::new("users")).unwrap();
        assert_eq!(users.primary_key.as_ref().unwrap().columns, vec!["user_id"]);
        assert_eq!(users.indexes[0].columns[0].expression, "login");
        let orders = snapshot.get_table(&Identifier::new("orders")).unwrap();
        assert_eq!(orders.parent_keys[0].parent_key.columns, vec!["user_id"]);
    }

    #[test]
    fn test_unnamed_unique_key_located_by_columns() {
        let mut state = state_with(vec![users()]);
        let key = DatabaseKey::unique(["username"]);

        state
            .apply_operation(&MigrationOperation::AddUniqueKey {
                table: Identifier::new("users"),
                key: key.clone(),
            })
            .unwrap();
        state
            .apply_operation(&MigrationOperation::RenameUniqueKey {
                table: Identifier::new("users"),
                key: key.clone(),
                new_name: Identifier::new("uk_username"),
            })
            .unwrap();
        state
            .apply_operation(&MigrationOperation::DropUniqueKey {
                table: Identifier::new("users"),
                key,
            })
            .unwrap();

        assert!(state.snapshot().tables[0].unique_keys.is_empty());
    }

    #[test]
    fn test_index_on_view() {
        let mut state = SchemaState::new();
        state
            .apply_operation(&MigrationOperation::CreateView {
                view: View::new("active_users", "SELECT id FROM users"),
            })
            .unwrap();
        state
            .apply_operation(&MigrationOperation::CreateIndex {
                table: Identifier::new("active_users"),
                index: DatabaseIndex::new("ix_active", ["id"]),
            })
            .unwrap();

        assert_eq!(state.snapshot().views[0].indexes.len(), 1);
    }

    #[test]
    fn test_alter_sequence() {
        let mut state = SchemaState::from_snapshot(
            SchemaSnapshot::new().sequence(Sequence::new("seq", 1, 1)),
        );
        state
            .apply_operation(&MigrationOperation::AlterSequence {
                existing: Sequence::new("seq", 1, 1),
                target: Sequence::new("seq", 1, 10).cycle(),
            })
            .unwrap();

        let sequence = &state.into_snapshot().sequences[0];
        assert_eq!(sequence.increment, 10);
        assert!(sequence.cycle);
    }

    #[test]
    fn test_qualified_names_use_defaults() {
        let mut state = SchemaState::from_snapshot(
            SchemaSnapshot::new()
                .with_identifier_defaults(IdentifierDefaults::new().schema("dbo"))
                .table(users()),
        );
        state
            .apply_operation(&MigrationOperation::DropTable {
                table: Table::new(Identifier::with_schema("dbo", "users")),
            })
            .unwrap();
        assert!(state.snapshot().tables.is_empty());
    }

    #[test]
    fn test_sql_is_a_no_op() {
        let mut state = state_with(vec![users()]);
        let before = state.snapshot().clone();
        state
            .apply_operation(&MigrationOperation::sql("UPDATE users SET id = id"))
            .unwrap();
        assert_eq!(state.snapshot(), &before);
    }

    #[test]
    fn test_duplicate_table_error() {
        let mut state = state_with(vec![users()]);
        let result = state.apply_operation(&MigrationOperation::CreateTable { table: users() });
        assert!(matches!(result, Err(MigrateError::InvalidState(_))));
    }

    #[test]
    fn test_missing_table_error() {
        let mut state = SchemaState::new();
        let result = state.apply_all(&[MigrationOperation::AddColumn {
            table: Identifier::new("nonexistent"),
            column: Column::new("col", DataType::new("text")),
        }]);
        assert!(
            matches!(result, Err(MigrateError::InvalidState(msg)) if msg.contains("nonexistent"))
        );
    }
}
