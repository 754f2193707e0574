//! Keys and check constraints.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// The kind of a key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyType {
    /// Primary key.
    Primary,
    /// Unique key.
    Unique,
    /// Child side of a foreign key.
    Foreign,
}

/// A key constraint over an ordered list of columns.
///
/// The name is optional because some databases report unnamed constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseKey {
    /// Constraint name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Identifier>,
    /// Kind of key.
    pub key_type: KeyType,
    /// Column names, in key order.
    pub columns: Vec<String>,
    /// Whether the constraint is enforced.
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

const fn enabled() -> bool {
    true
}

impl DatabaseKey {
    /// Creates an unnamed key.
    #[must_use]
    pub fn new<I, S>(key_type: KeyType, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            key_type,
            columns: columns.into_iter().map(Into::into).collect(),
            is_enabled: true,
        }
    }

    /// Creates an unnamed primary key.
    #[must_use]
    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyType::Primary, columns)
    }

    /// Creates an unnamed unique key.
    #[must_use]
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyType::Unique, columns)
    }

    /// Creates an unnamed foreign (child) key.
    #[must_use]
    pub fn foreign<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyType::Foreign, columns)
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Identifier::new(name));
        self
    }

    /// Marks the constraint as disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Returns the local constraint name, if any.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        self.name.as_ref().map(Identifier::local_name)
    }
}

/// Referential action taken on delete or update of a parent row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum ReferentialAction {
    /// No action (checked at end of statement).
    #[default]
    NoAction,
    /// Restrict (checked immediately).
    Restrict,
    /// Cascade the change to child rows.
    Cascade,
    /// Set child columns to NULL.
    SetNull,
    /// Set child columns to their default.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL keyword for this action.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key relationship between a child table and a parent table.
///
/// The relationship is stored once, on the child table. Tables are
/// referenced by identifier, never by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationalKey {
    /// Table holding the foreign key.
    pub child_table: Identifier,
    /// The foreign key on the child table.
    pub child_key: DatabaseKey,
    /// Referenced table.
    pub parent_table: Identifier,
    /// Referenced primary or unique key on the parent table.
    pub parent_key: DatabaseKey,
    /// ON DELETE action.
    #[serde(default)]
    pub delete_action: ReferentialAction,
    /// ON UPDATE action.
    #[serde(default)]
    pub update_action: ReferentialAction,
}

impl RelationalKey {
    /// Creates a relationship with NO ACTION on delete and update.
    #[must_use]
    pub fn new(
        child_table: impl Into<Identifier>,
        child_key: DatabaseKey,
        parent_table: impl Into<Identifier>,
        parent_key: DatabaseKey,
    ) -> Self {
        Self {
            child_table: child_table.into(),
            child_key,
            parent_table: parent_table.into(),
            parent_key,
            delete_action: ReferentialAction::NoAction,
            update_action: ReferentialAction::NoAction,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.delete_action = action;
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.update_action = action;
        self
    }

    /// Returns the foreign key's constraint name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&Identifier> {
        self.child_key.name.as_ref()
    }

    /// Returns true if the key references its own table.
    #[must_use]
    pub fn is_self_referencing(&self) -> bool {
        self.child_table == self.parent_table
    }
}

/// A CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Constraint name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Identifier>,
    /// Check expression.
    pub definition: String,
    /// Whether the constraint is enforced.
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

impl CheckConstraint {
    /// Creates an unnamed check.
    #[must_use]
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            name: None,
            definition: definition.into(),
            is_enabled: true,
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Identifier::new(name));
        self
    }

    /// Returns the local constraint name, if any.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        self.name.as_ref().map(Identifier::local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        let pk = DatabaseKey::primary(["id"]).named("pk_users");
        assert_eq!(pk.key_type, KeyType::Primary);
        assert_eq!(pk.local_name(), Some("pk_users"));
        assert!(pk.is_enabled);

        let uk = DatabaseKey::unique(["a", "b"]).disabled();
        assert_eq!(uk.columns, vec!["a", "b"]);
        assert_eq!(uk.local_name(), None);
        assert!(!uk.is_enabled);
    }

    #[test]
    fn test_relational_key() {
        let fk = RelationalKey::new(
            "orders",
            DatabaseKey::foreign(["user_id"]).named("fk_orders_users"),
            "users",
            DatabaseKey::primary(["id"]),
        )
        .on_delete(ReferentialAction::Cascade);

        assert_eq!(fk.name().map(Identifier::local_name), Some("fk_orders_users"));
        assert_eq!(fk.delete_action.as_sql(), "CASCADE");
        assert_eq!(fk.update_action, ReferentialAction::NoAction);
        assert!(!fk.is_self_referencing());
    }

    #[test]
    fn test_disabled_flag_defaults_when_missing() {
        let check: CheckConstraint =
            serde_json::from_str(r#"{"definition": "price > 0"}"#).unwrap();
        assert!(check.is_enabled);
        assert_eq!(check.name, None);
    }
}
