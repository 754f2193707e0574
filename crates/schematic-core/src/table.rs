//! Table definitions.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::constraint::{CheckConstraint, DatabaseKey, KeyType, RelationalKey};
use crate::identifier::Identifier;
use crate::index::DatabaseIndex;
use crate::trigger::Trigger;

/// A relational table and the entities it owns.
///
/// Foreign keys are stored on the child table (`parent_keys`). Keys that
/// reference this table from other tables are not stored here; they are
/// derived from the enclosing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: Identifier,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Check constraints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckConstraint>,
    /// Indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<DatabaseIndex>,
    /// Primary key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<DatabaseKey>,
    /// Unique keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_keys: Vec<DatabaseKey>,
    /// Foreign keys declared on this table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_keys: Vec<RelationalKey>,
    /// Triggers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            checks: Vec::new(),
            indexes: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            parent_keys: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key.
    #[must_use]
    pub fn primary_key(mut self, key: DatabaseKey) -> Self {
        self.primary_key = Some(DatabaseKey {
            key_type: KeyType::Primary,
            ..key
        });
        self
    }

    /// Adds a unique key.
    #[must_use]
    pub fn unique_key(mut self, key: DatabaseKey) -> Self {
        self.unique_keys.push(DatabaseKey {
            key_type: KeyType::Unique,
            ..key
        });
        self
    }

    /// Adds a foreign key referencing `parent_table`.
    ///
    /// The child table of the relationship is always this table.
    #[must_use]
    pub fn foreign_key(mut self, key: RelationalKey) -> Self {
        self.parent_keys.push(RelationalKey {
            child_table: self.name.clone(),
            ..key
        });
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: DatabaseIndex) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a check constraint.
    #[must_use]
    pub fn check(mut self, check: CheckConstraint) -> Self {
        self.checks.push(check);
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Gets a column by local name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.local_name() == name)
    }

    /// Gets a mutable column by local name.
    #[must_use]
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.local_name() == name)
    }

    /// Gets an index by local name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&DatabaseIndex> {
        self.indexes.iter().find(|i| i.local_name() == name)
    }

    /// Returns the table with no constraints, indexes or triggers: only its
    /// name and columns.
    #[must_use]
    pub fn columns_only(&self) -> Self {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            ..Self::new(self.name.clone())
        }
    }

    /// Returns the table's local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::DataType;
    use crate::constraint::ReferentialAction;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", DataType::new("integer")).not_null())
            .column(Column::new("email", DataType::new("text")))
            .primary_key(DatabaseKey::primary(["id"]).named("pk_users"))
            .unique_key(DatabaseKey::unique(["email"]))
            .index(DatabaseIndex::new("ix_users_email", ["email"]))
    }

    #[test]
    fn test_table_builder() {
        let table = users();
        assert_eq!(table.local_name(), "users");
        assert_eq!(table.columns.len(), 2);
        assert!(table.get_column("email").is_some());
        assert!(table.get_column("missing").is_none());
        assert!(table.get_index("ix_users_email").is_some());
        assert_eq!(table.unique_keys[0].key_type, KeyType::Unique);
    }

    #[test]
    fn test_primary_key_type_is_forced() {
        let table = Table::new("t").primary_key(DatabaseKey::unique(["id"]));
        assert_eq!(
            table.primary_key.map(|k| k.key_type),
            Some(KeyType::Primary)
        );
    }

    #[test]
    fn test_foreign_key_child_is_owner() {
        let table = Table::new("orders").foreign_key(
            RelationalKey::new(
                "somewhere_else",
                DatabaseKey::foreign(["user_id"]),
                "users",
                DatabaseKey::primary(["id"]),
            )
            .on_delete(ReferentialAction::Cascade),
        );

        assert_eq!(table.parent_keys[0].child_table, Identifier::new("orders"));
        assert_eq!(table.parent_keys[0].parent_table, Identifier::new("users"));
    }

    #[test]
    fn test_columns_only() {
        let bare = users().columns_only();
        assert_eq!(bare.columns.len(), 2);
        assert!(bare.primary_key.is_none());
        assert!(bare.indexes.is_empty());
        assert!(bare.unique_keys.is_empty());
    }
}
