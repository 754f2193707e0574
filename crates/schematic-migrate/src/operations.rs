//! Migration operations.
//!
//! A migration is an ordered list of [`MigrationOperation`]s. Each variant
//! carries the full state of the entity it touches (and, for alterations,
//! both the existing and the target state), so a SQL generator can render
//! it without going back to the database, and every operation except raw
//! SQL can be reversed.

use std::fmt;

use serde::{Deserialize, Serialize};

use schematic_core::{
    CheckConstraint, Column, DatabaseIndex, DatabaseKey, Identifier, RelationalKey, Routine,
    Sequence, Synonym, Table, Trigger, View,
};

/// A single migration operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationOperation {
    /// Create a table. After resolution the table holds its columns only;
    /// its keys, indexes, checks and triggers follow as their own operations.
    CreateTable {
        /// Table definition.
        table: Table,
    },

    /// Drop a table.
    DropTable {
        /// Table definition (for reversal).
        table: Table,
    },

    /// Rename a table.
    RenameTable {
        /// Table definition under its current name.
        table: Table,
        /// New table name.
        new_name: Identifier,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: Identifier,
        /// Column definition.
        column: Column,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: Identifier,
        /// Column definition (for reversal).
        column: Column,
    },

    /// Alter a column's type, nullability, default or identity settings.
    AlterColumn {
        /// Table name.
        table: Identifier,
        /// Column as it exists.
        existing: Column,
        /// Column as it should become.
        target: Column,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: Identifier,
        /// Column under its current name.
        column: Column,
        /// New column name.
        new_name: Identifier,
    },

    /// Add a primary key.
    AddPrimaryKey {
        /// Table name.
        table: Identifier,
        /// Key definition.
        key: DatabaseKey,
    },

    /// Drop a primary key.
    DropPrimaryKey {
        /// Table name.
        table: Identifier,
        /// Key definition.
        key: DatabaseKey,
    },

    /// Rename a primary key constraint.
    RenamePrimaryKey {
        /// Table name.
        table: Identifier,
        /// Key under its current name.
        key: DatabaseKey,
        /// New constraint name.
        new_name: Identifier,
    },

    /// Add a unique key.
    AddUniqueKey {
        /// Table name.
        table: Identifier,
        /// Key definition.
        key: DatabaseKey,
    },

    /// Drop a unique key.
    DropUniqueKey {
        /// Table name.
        table: Identifier,
        /// Key definition.
        key: DatabaseKey,
    },

    /// Rename a unique key constraint.
    RenameUniqueKey {
        /// Table name.
        table: Identifier,
        /// Key under its current name.
        key: DatabaseKey,
        /// New constraint name.
        new_name: Identifier,
    },

    /// Add a foreign key. The owning table is the key's child table.
    AddForeignKey {
        /// Relationship definition.
        foreign_key: RelationalKey,
    },

    /// Drop a foreign key.
    DropForeignKey {
        /// Relationship definition.
        foreign_key: RelationalKey,
    },

    /// Rename a foreign key constraint.
    RenameForeignKey {
        /// Relationship under its current name.
        foreign_key: RelationalKey,
        /// New constraint name.
        new_name: Identifier,
    },

    /// Create an index on a table or view.
    CreateIndex {
        /// Table or view name.
        table: Identifier,
        /// Index definition.
        index: DatabaseIndex,
    },

    /// Drop an index.
    DropIndex {
        /// Table or view name.
        table: Identifier,
        /// Index definition.
        index: DatabaseIndex,
    },

    /// Rename an index.
    RenameIndex {
        /// Table or view name.
        table: Identifier,
        /// Index under its current name.
        index: DatabaseIndex,
        /// New index name.
        new_name: Identifier,
    },

    /// Add a check constraint.
    AddCheck {
        /// Table name.
        table: Identifier,
        /// Check definition.
        check: CheckConstraint,
    },

    /// Drop a check constraint.
    DropCheck {
        /// Table name.
        table: Identifier,
        /// Check definition.
        check: CheckConstraint,
    },

    /// Rename a check constraint.
    RenameCheck {
        /// Table name.
        table: Identifier,
        /// Check under its current name.
        check: CheckConstraint,
        /// New constraint name.
        new_name: Identifier,
    },

    /// Create a trigger.
    AddTrigger {
        /// Table name.
        table: Identifier,
        /// Trigger definition.
        trigger: Trigger,
    },

    /// Drop a trigger.
    DropTrigger {
        /// Table name.
        table: Identifier,
        /// Trigger definition.
        trigger: Trigger,
    },

    /// Create a view. Its indexes are created by their own operations.
    CreateView {
        /// View definition.
        view: View,
    },

    /// Drop a view.
    DropView {
        /// View definition.
        view: View,
    },

    /// Create a sequence.
    CreateSequence {
        /// Sequence definition.
        sequence: Sequence,
    },

    /// Drop a sequence.
    DropSequence {
        /// Sequence definition.
        sequence: Sequence,
    },

    /// Alter a sequence in place.
    AlterSequence {
        /// Sequence as it exists.
        existing: Sequence,
        /// Sequence as it should become.
        target: Sequence,
    },

    /// Create a synonym.
    CreateSynonym {
        /// Synonym definition.
        synonym: Synonym,
    },

    /// Drop a synonym.
    DropSynonym {
        /// Synonym definition.
        synonym: Synonym,
    },

    /// Create a routine.
    CreateRoutine {
        /// Routine definition.
        routine: Routine,
    },

    /// Drop a routine.
    DropRoutine {
        /// Routine definition.
        routine: Routine,
    },

    /// Run raw SQL.
    Sql {
        /// SQL text.
        sql: String,
    },
}

/// The kind of a [`MigrationOperation`], without its payload.
///
/// Used as the lookup key of the resolver and SQL generator registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    /// Create table.
    CreateTable,
    /// Drop table.
    DropTable,
    /// Rename table.
    RenameTable,
    /// Add column.
    AddColumn,
    /// Drop column.
    DropColumn,
    /// Alter column.
    AlterColumn,
    /// Rename column.
    RenameColumn,
    /// Add primary key.
    AddPrimaryKey,
    /// Drop primary key.
    DropPrimaryKey,
    /// Rename primary key.
    RenamePrimaryKey,
    /// Add unique key.
    AddUniqueKey,
    /// Drop unique key.
    DropUniqueKey,
    /// Rename unique key.
    RenameUniqueKey,
    /// Add foreign key.
    AddForeignKey,
    /// Drop foreign key.
    DropForeignKey,
    /// Rename foreign key.
    RenameForeignKey,
    /// Create index.
    CreateIndex,
    /// Drop index.
    DropIndex,
    /// Rename index.
    RenameIndex,
    /// Add check.
    AddCheck,
    /// Drop check.
    DropCheck,
    /// Rename check.
    RenameCheck,
    /// Add trigger.
    AddTrigger,
    /// Drop trigger.
    DropTrigger,
    /// Create view.
    CreateView,
    /// Drop view.
    DropView,
    /// Create sequence.
    CreateSequence,
    /// Drop sequence.
    DropSequence,
    /// Alter sequence.
    AlterSequence,
    /// Create synonym.
    CreateSynonym,
    /// Drop synonym.
    DropSynonym,
    /// Create routine.
    CreateRoutine,
    /// Drop routine.
    DropRoutine,
    /// Raw SQL.
    Sql,
}

impl OperationKind {
    /// Every operation kind.
    pub const ALL: [Self; 34] = [
        Self::CreateTable,
        Self::DropTable,
        Self::RenameTable,
        Self::AddColumn,
        Self::DropColumn,
        Self::AlterColumn,
        Self::RenameColumn,
        Self::AddPrimaryKey,
        Self::DropPrimaryKey,
        Self::RenamePrimaryKey,
        Self::AddUniqueKey,
        Self::DropUniqueKey,
        Self::RenameUniqueKey,
        Self::AddForeignKey,
        Self::DropForeignKey,
        Self::RenameForeignKey,
        Self::CreateIndex,
        Self::DropIndex,
        Self::RenameIndex,
        Self::AddCheck,
        Self::DropCheck,
        Self::RenameCheck,
        Self::AddTrigger,
        Self::DropTrigger,
        Self::CreateView,
        Self::DropView,
        Self::CreateSequence,
        Self::DropSequence,
        Self::AlterSequence,
        Self::CreateSynonym,
        Self::DropSynonym,
        Self::CreateRoutine,
        Self::DropRoutine,
        Self::Sql,
    ];

    /// Returns true for renames.
    #[must_use]
    pub const fn is_rename(self) -> bool {
        matches!(
            self,
            Self::RenameTable
                | Self::RenameColumn
                | Self::RenamePrimaryKey
                | Self::RenameUniqueKey
                | Self::RenameForeignKey
                | Self::RenameIndex
                | Self::RenameCheck
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl MigrationOperation {
    /// Creates a raw SQL operation.
    #[must_use]
    pub fn sql(sql: impl Into<String>) -> Self {
        Self::Sql { sql: sql.into() }
    }

    /// Returns the kind of this operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable { .. } => OperationKind::CreateTable,
            Self::DropTable { .. } => OperationKind::DropTable,
            Self::RenameTable { .. } => OperationKind::RenameTable,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::DropColumn { .. } => OperationKind::DropColumn,
            Self::AlterColumn { .. } => OperationKind::AlterColumn,
            Self::RenameColumn { .. } => OperationKind::RenameColumn,
            Self::AddPrimaryKey { .. } => OperationKind::AddPrimaryKey,
            Self::DropPrimaryKey { .. } => OperationKind::DropPrimaryKey,
            Self::RenamePrimaryKey { .. } => OperationKind::RenamePrimaryKey,
            Self::AddUniqueKey { .. } => OperationKind::AddUniqueKey,
            Self::DropUniqueKey { .. } => OperationKind::DropUniqueKey,
            Self::RenameUniqueKey { .. } => OperationKind::RenameUniqueKey,
            Self::AddForeignKey { .. } => OperationKind::AddForeignKey,
            Self::DropForeignKey { .. } => OperationKind::DropForeignKey,
            Self::RenameForeignKey { .. } => OperationKind::RenameForeignKey,
            Self::CreateIndex { .. } => OperationKind::CreateIndex,
            Self::DropIndex { .. } => OperationKind::DropIndex,
            Self::RenameIndex { .. } => OperationKind::RenameIndex,
            Self::AddCheck { .. } => OperationKind::AddCheck,
            Self::DropCheck { .. } => OperationKind::DropCheck,
            Self::RenameCheck { .. } => OperationKind::RenameCheck,
            Self::AddTrigger { .. } => OperationKind::AddTrigger,
            Self::DropTrigger { .. } => OperationKind::DropTrigger,
            Self::CreateView { .. } => OperationKind::CreateView,
            Self::DropView { .. } => OperationKind::DropView,
            Self::CreateSequence { .. } => OperationKind::CreateSequence,
            Self::DropSequence { .. } => OperationKind::DropSequence,
            Self::AlterSequence { .. } => OperationKind::AlterSequence,
            Self::CreateSynonym { .. } => OperationKind::CreateSynonym,
            Self::DropSynonym { .. } => OperationKind::DropSynonym,
            Self::CreateRoutine { .. } => OperationKind::CreateRoutine,
            Self::DropRoutine { .. } => OperationKind::DropRoutine,
            Self::Sql { .. } => OperationKind::Sql,
        }
    }

    /// Returns the table or view this operation is scoped to.
    ///
    /// Table and view operations return the object's own name. Sequences,
    /// synonyms, routines and raw SQL are not scoped to a table.
    #[must_use]
    pub const fn owner(&self) -> Option<&Identifier> {
        match self {
            Self::CreateTable { table }
            | Self::DropTable { table }
            | Self::RenameTable { table, .. } => Some(&table.name),
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::AddPrimaryKey { table, .. }
            | Self::DropPrimaryKey { table, .. }
            | Self::RenamePrimaryKey { table, .. }
            | Self::AddUniqueKey { table, .. }
            | Self::DropUniqueKey { table, .. }
            | Self::RenameUniqueKey { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::RenameIndex { table, .. }
            | Self::AddCheck { table, .. }
            | Self::DropCheck { table, .. }
            | Self::RenameCheck { table, .. }
            | Self::AddTrigger { table, .. }
            | Self::DropTrigger { table, .. } => Some(table),
            Self::AddForeignKey { foreign_key }
            | Self::DropForeignKey { foreign_key }
            | Self::RenameForeignKey { foreign_key, .. } => Some(&foreign_key.child_table),
            Self::CreateView { view } | Self::DropView { view } => Some(&view.name),
            Self::CreateSequence { .. }
            | Self::DropSequence { .. }
            | Self::AlterSequence { .. }
            | Self::CreateSynonym { .. }
            | Self::DropSynonym { .. }
            | Self::CreateRoutine { .. }
            | Self::DropRoutine { .. }
            | Self::Sql { .. } => None,
        }
    }

    /// Returns the name of the entity this operation touches, as it exists
    /// before the operation. Unnamed constraints and raw SQL return `None`.
    #[must_use]
    pub fn subject_name(&self) -> Option<&Identifier> {
        match self {
            Self::CreateTable { table }
            | Self::DropTable { table }
            | Self::RenameTable { table, .. } => Some(&table.name),
            Self::AddColumn { column, .. }
            | Self::DropColumn { column, .. }
            | Self::RenameColumn { column, .. } => Some(&column.name),
            Self::AlterColumn { existing, .. } => Some(&existing.name),
            Self::AddPrimaryKey { key, .. }
            | Self::DropPrimaryKey { key, .. }
            | Self::RenamePrimaryKey { key, .. }
            | Self::AddUniqueKey { key, .. }
            | Self::DropUniqueKey { key, .. }
            | Self::RenameUniqueKey { key, .. } => key.name.as_ref(),
            Self::AddForeignKey { foreign_key }
            | Self::DropForeignKey { foreign_key }
            | Self::RenameForeignKey { foreign_key, .. } => foreign_key.name(),
            Self::CreateIndex { index, .. }
            | Self::DropIndex { index, .. }
            | Self::RenameIndex { index, .. } => Some(&index.name),
            Self::AddCheck { check, .. }
            | Self::DropCheck { check, .. }
            | Self::RenameCheck { check, .. } => check.name.as_ref(),
            Self::AddTrigger { trigger, .. } | Self::DropTrigger { trigger, .. } => {
                Some(&trigger.name)
            }
            Self::CreateView { view } | Self::DropView { view } => Some(&view.name),
            Self::CreateSequence { sequence } | Self::DropSequence { sequence } => {
                Some(&sequence.name)
            }
            Self::AlterSequence { existing, .. } => Some(&existing.name),
            Self::CreateSynonym { synonym } | Self::DropSynonym { synonym } => {
                Some(&synonym.name)
            }
            Self::CreateRoutine { routine } | Self::DropRoutine { routine } => {
                Some(&routine.name)
            }
            Self::Sql { .. } => None,
        }
    }

    /// Returns the reverse operation for rollback.
    ///
    /// Every operation carries the full state it needs, so only raw SQL is
    /// irreversible.
    #[must_use]
    pub fn reverse(&self) -> Option<Self> {
        let op = match self {
            Self::CreateTable { table } => Self::DropTable {
                table: table.clone(),
            },
            Self::DropTable { table } => Self::CreateTable {
                table: table.clone(),
            },
            Self::RenameTable { table, new_name } => Self::RenameTable {
                table: Table {
                    name: new_name.clone(),
                    ..table.clone()
                },
                new_name: table.name.clone(),
            },
            Self::AddColumn { table, column } => Self::DropColumn {
                table: table.clone(),
                column: column.clone(),
            },
            Self::DropColumn { table, column } => Self::AddColumn {
                table: table.clone(),
                column: column.clone(),
            },
            Self::AlterColumn {
                table,
                existing,
                target,
            } => Self::AlterColumn {
                table: table.clone(),
                existing: target.clone(),
                target: existing.clone(),
            },
            Self::RenameColumn {
                table,
                column,
                new_name,
            } => Self::RenameColumn {
                table: table.clone(),
                column: Column {
                    name: new_name.clone(),
                    ..column.clone()
                },
                new_name: column.name.clone(),
            },
            Self::AddPrimaryKey { table, key } => Self::DropPrimaryKey {
                table: table.clone(),
                key: key.clone(),
            },
            Self::DropPrimaryKey { table, key } => Self::AddPrimaryKey {
                table: table.clone(),
                key: key.clone(),
            },
            Self::RenamePrimaryKey {
                table,
                key,
                new_name,
            } => Self::RenamePrimaryKey {
                table: table.clone(),
                key: renamed_key(key, new_name),
                new_name: key.name.clone()?,
            },
            Self::AddUniqueKey { table, key } => Self::DropUniqueKey {
                table: table.clone(),
                key: key.clone(),
            },
            Self::DropUniqueKey { table, key } => Self::AddUniqueKey {
                table: table.clone(),
                key: key.clone(),
            },
            Self::RenameUniqueKey {
                table,
                key,
                new_name,
            } => Self::RenameUniqueKey {
                table: table.clone(),
                key: renamed_key(key, new_name),
                new_name: key.name.clone()?,
            },
            Self::AddForeignKey { foreign_key } => Self::DropForeignKey {
                foreign_key: foreign_key.clone(),
            },
            Self::DropForeignKey { foreign_key } => Self::AddForeignKey {
                foreign_key: foreign_key.clone(),
            },
            Self::RenameForeignKey {
                foreign_key,
                new_name,
            } => Self::RenameForeignKey {
                foreign_key: RelationalKey {
                    child_key: renamed_key(&foreign_key.child_key, new_name),
                    ..foreign_key.clone()
                },
                new_name: foreign_key.name()?.clone(),
            },
            Self::CreateIndex { table, index } => Self::DropIndex {
                table: table.clone(),
                index: index.clone(),
            },
            Self::DropIndex { table, index } => Self::CreateIndex {
                table: table.clone(),
                index: index.clone(),
            },
            Self::RenameIndex {
                table,
                index,
                new_name,
            } => Self::RenameIndex {
                table: table.clone(),
                index: DatabaseIndex {
                    name: new_name.clone(),
                    ..index.clone()
                },
                new_name: index.name.clone(),
            },
            Self::AddCheck { table, check } => Self::DropCheck {
                table: table.clone(),
                check: check.clone(),
            },
            Self::DropCheck { table, check } => Self::AddCheck {
                table: table.clone(),
                check: check.clone(),
            },
            Self::RenameCheck {
                table,
                check,
                new_name,
            } => Self::RenameCheck {
                table: table.clone(),
                check: CheckConstraint {
                    name: Some(new_name.clone()),
                    ..check.clone()
                },
                new_name: check.name.clone()?,
            },
            Self::AddTrigger { table, trigger } => Self::DropTrigger {
                table: table.clone(),
                trigger: trigger.clone(),
            },
            Self::DropTrigger { table, trigger } => Self::AddTrigger {
                table: table.clone(),
                trigger: trigger.clone(),
            },
            Self::CreateView { view } => Self::DropView { view: view.clone() },
            Self::DropView { view } => Self::CreateView { view: view.clone() },
            Self::CreateSequence { sequence } => Self::DropSequence {
                sequence: sequence.clone(),
            },
            Self::DropSequence { sequence } => Self::CreateSequence {
                sequence: sequence.clone(),
            },
            Self::AlterSequence { existing, target } => Self::AlterSequence {
                existing: target.clone(),
                target: existing.clone(),
            },
            Self::CreateSynonym { synonym } => Self::DropSynonym {
                synonym: synonym.clone(),
            },
            Self::DropSynonym { synonym } => Self::CreateSynonym {
                synonym: synonym.clone(),
            },
            Self::CreateRoutine { routine } => Self::DropRoutine {
                routine: routine.clone(),
            },
            Self::DropRoutine { routine } => Self::CreateRoutine {
                routine: routine.clone(),
            },
            Self::Sql { .. } => return None,
        };
        Some(op)
    }

    /// Returns true if this operation can be reversed.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.reverse().is_some()
    }

    /// Returns true if applying the operation can discard stored data.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DropTable { .. }
                | Self::DropColumn { .. }
                | Self::AlterColumn { .. }
                | Self::DropSequence { .. }
                | Self::DropView { view: View { is_materialized: true, .. } }
                | Self::Sql { .. }
        )
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("Create table '{}'", table.name),
            Self::DropTable { table } => format!("Drop table '{}'", table.name),
            Self::RenameTable { table, new_name } => {
                format!("Rename table '{}' to '{}'", table.name, new_name)
            }
            Self::AddColumn { table, column } => {
                format!("Add column '{}' to table '{}'", column.name, table)
            }
            Self::DropColumn { table, column } => {
                format!("Drop column '{}' from table '{}'", column.name, table)
            }
            Self::AlterColumn {
                table, existing, ..
            } => format!("Alter column '{}' in table '{}'", existing.name, table),
            Self::RenameColumn {
                table,
                column,
                new_name,
            } => format!(
                "Rename column '{}' to '{}' in table '{}'",
                column.name, new_name, table
            ),
            Self::AddPrimaryKey { table, key } => {
                format!("Add primary key {} to table '{}'", key_label(key), table)
            }
            Self::DropPrimaryKey { table, key } => {
                format!("Drop primary key {} from table '{}'", key_label(key), table)
            }
            Self::RenamePrimaryKey {
                table,
                key,
                new_name,
            } => format!(
                "Rename primary key {} to '{}' in table '{}'",
                key_label(key),
                new_name,
                table
            ),
            Self::AddUniqueKey { table, key } => {
                format!("Add unique key {} to table '{}'", key_label(key), table)
            }
            Self::DropUniqueKey { table, key } => {
                format!("Drop unique key {} from table '{}'", key_label(key), table)
            }
            Self::RenameUniqueKey {
                table,
                key,
                new_name,
            } => format!(
                "Rename unique key {} to '{}' in table '{}'",
                key_label(key),
                new_name,
                table
            ),
            Self::AddForeignKey { foreign_key } => format!(
                "Add foreign key {} from table '{}' to table '{}'",
                key_label(&foreign_key.child_key),
                foreign_key.child_table,
                foreign_key.parent_table
            ),
            Self::DropForeignKey { foreign_key } => format!(
                "Drop foreign key {} from table '{}'",
                key_label(&foreign_key.child_key),
                foreign_key.child_table
            ),
            Self::RenameForeignKey {
                foreign_key,
                new_name,
            } => format!(
                "Rename foreign key {} to '{}' in table '{}'",
                key_label(&foreign_key.child_key),
                new_name,
                foreign_key.child_table
            ),
            Self::CreateIndex { table, index } => {
                format!("Create index '{}' on '{}'", index.name, table)
            }
            Self::DropIndex { table, index } => {
                format!("Drop index '{}' from '{}'", index.name, table)
            }
            Self::RenameIndex {
                table,
                index,
                new_name,
            } => format!(
                "Rename index '{}' to '{}' on '{}'",
                index.name, new_name, table
            ),
            Self::AddCheck { table, check } => format!(
                "Add check {} to table '{}'",
                check_label(check),
                table
            ),
            Self::DropCheck { table, check } => format!(
                "Drop check {} from table '{}'",
                check_label(check),
                table
            ),
            Self::RenameCheck {
                table,
                check,
                new_name,
            } => format!(
                "Rename check {} to '{}' in table '{}'",
                check_label(check),
                new_name,
                table
            ),
            Self::AddTrigger { table, trigger } => {
                format!("Add trigger '{}' to table '{}'", trigger.name, table)
            }
            Self::DropTrigger { table, trigger } => {
                format!("Drop trigger '{}' from table '{}'", trigger.name, table)
            }
            Self::CreateView { view } => format!("Create view '{}'", view.name),
            Self::DropView { view } => format!("Drop view '{}'", view.name),
            Self::CreateSequence { sequence } => format!("Create sequence '{}'", sequence.name),
            Self::DropSequence { sequence } => format!("Drop sequence '{}'", sequence.name),
            Self::AlterSequence { existing, .. } => {
                format!("Alter sequence '{}'", existing.name)
            }
            Self::CreateSynonym { synonym } => format!(
                "Create synonym '{}' for '{}'",
                synonym.name, synonym.target
            ),
            Self::DropSynonym { synonym } => format!("Drop synonym '{}'", synonym.name),
            Self::CreateRoutine { routine } => format!("Create routine '{}'", routine.name),
            Self::DropRoutine { routine } => format!("Drop routine '{}'", routine.name),
            Self::Sql { .. } => "Run custom SQL".to_string(),
        }
    }
}

impl fmt::Display for MigrationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

fn renamed_key(key: &DatabaseKey, new_name: &Identifier) -> DatabaseKey {
    DatabaseKey {
        name: Some(new_name.clone()),
        ..key.clone()
    }
}

fn key_label(key: &DatabaseKey) -> String {
    key.name.as_ref().map_or_else(
        || format!("({})", key.columns.join(", ")),
        |name| format!("'{name}'"),
    )
}

fn check_label(check: &CheckConstraint) -> String {
    check.name.as_ref().map_or_else(
        || format!("({})", check.definition),
        |name| format!("'{name}'"),
    )
}
