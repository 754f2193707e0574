use schematic_core::{
    CheckConstraint, Column, DataType, DatabaseIndex, DatabaseKey, IdentifierDefaults,
    RelationalKey, Trigger,
};

use super::Comparer;

/// Compares data types by canonical name, length and precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeComparer;

impl Comparer<DataType> for TypeComparer {
    fn equals(&self, a: &DataType, b: &DataType) -> bool {
        a.canonical_name() == b.canonical_name()
            && a.max_length == b.max_length
            && a.precision == b.precision
    }
}

/// Compares columns by type, nullability, default, computed-ness and
/// identity settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnComparer;

impl Comparer<Column> for ColumnComparer {
    fn equals(&self, a: &Column, b: &Column) -> bool {
        a.is_nullable == b.is_nullable
            && a.is_computed == b.is_computed
            && a.default_value.as_deref().map(str::trim)
                == b.default_value.as_deref().map(str::trim)
            && a.auto_increment == b.auto_increment
            && TypeComparer.equals(&a.data_type, &b.data_type)
    }
}

/// Compares keys by type and ordered columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyComparer;

impl Comparer<DatabaseKey> for KeyComparer {
    fn equals(&self, a: &DatabaseKey, b: &DatabaseKey) -> bool {
        a.key_type == b.key_type && a.columns == b.columns
    }
}

/// Compares indexes by key elements, included columns and uniqueness.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexComparer;

impl Comparer<DatabaseIndex> for IndexComparer {
    fn equals(&self, a: &DatabaseIndex, b: &DatabaseIndex) -> bool {
        a.is_unique == b.is_unique
            && a.included_columns == b.included_columns
            && a.columns.len() == b.columns.len()
            && a.columns
                .iter()
                .zip(&b.columns)
                .all(|(x, y)| x.expression.trim() == y.expression.trim() && x.order == y.order)
    }
}

/// Compares foreign keys by both keys, the referenced table and the
/// referential actions.
#[derive(Debug, Clone, Default)]
pub struct RelationalKeyComparer {
    defaults: IdentifierDefaults,
}

impl RelationalKeyComparer {
    /// Creates a comparer that qualifies parent tables with `defaults`.
    #[must_use]
    pub const fn new(defaults: IdentifierDefaults) -> Self {
        Self { defaults }
    }
}

impl Comparer<RelationalKey> for RelationalKeyComparer {
    fn equals(&self, a: &RelationalKey, b: &RelationalKey) -> bool {
        KeyComparer.equals(&a.child_key, &b.child_key)
            && KeyComparer.equals(&a.parent_key, &b.parent_key)
            && a.parent_table.same_object(&b.parent_table, &self.defaults)
            && a.delete_action == b.delete_action
            && a.update_action == b.update_action
    }
}

/// Compares check constraints by definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckComparer;

impl Comparer<CheckConstraint> for CheckComparer {
    fn equals(&self, a: &CheckConstraint, b: &CheckConstraint) -> bool {
        a.definition.trim() == b.definition.trim()
    }
}

/// Compares triggers by definition, timing and events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerComparer;

impl Comparer<Trigger> for TriggerComparer {
    fn equals(&self, a: &Trigger, b: &Trigger) -> bool {
        a.definition.trim() == b.definition.trim() && a.timing == b.timing && a.events == b.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematic_core::{IndexColumn, ReferentialAction, TriggerEvent, TriggerTiming};

    #[test]
    fn test_type_comparer_ignores_case() {
        assert!(TypeComparer.equals(&DataType::new("INTEGER"), &DataType::new(" integer")));
        assert!(!TypeComparer.equals(
            &DataType::with_length("varchar", 50),
            &DataType::with_length("varchar", 100)
        ));
        assert!(!TypeComparer.equals(
            &DataType::with_precision("decimal", 10, 2),
            &DataType::with_precision("decimal", 10, 4)
        ));
    }

    #[test]
    fn test_column_comparer_ignores_name() {
        let a = Column::new("a", DataType::new("int")).not_null();
        let b = Column::new("b", DataType::new("INT")).not_null();
        assert!(ColumnComparer.equals(&a, &b));

        assert!(!ColumnComparer.equals(&a, &a.clone().nullable()));
        assert!(!ColumnComparer.equals(&a, &a.clone().default_value("0")));
        assert!(!ColumnComparer.equals(&a, &a.clone().auto_increment(1, 1)));
        assert!(!ColumnComparer.equals(&a, &a.clone().computed()));
    }

    #[test]
    fn test_key_comparer_is_order_sensitive() {
        let a = DatabaseKey::unique(["x", "y"]).named("uk_a");
        let b = DatabaseKey::unique(["x", "y"]);
        let c = DatabaseKey::unique(["y", "x"]);
        assert!(KeyComparer.equals(&a, &b));
        assert!(!KeyComparer.equals(&a, &c));
        assert!(KeyComparer.equals(&a, &a.clone().disabled()));
    }

    #[test]
    fn test_index_comparer() {
        let a = DatabaseIndex::new("ix_a", ["x", "y"]);
        let b = DatabaseIndex::new("ix_b", ["x", "y"]);
        assert!(IndexComparer.equals(&a, &b));
        assert!(!IndexComparer.equals(&a, &a.clone().unique()));
        assert!(!IndexComparer.equals(&a, &a.clone().include(["z"])));

        let desc = DatabaseIndex::from_columns(
            "ix_a",
            vec![IndexColumn::new("x").descending(), IndexColumn::new("y")],
        );
        assert!(!IndexComparer.equals(&a, &desc));
    }

    #[test]
    fn test_relational_key_comparer() {
        let comparer = RelationalKeyComparer::new(IdentifierDefaults::new().schema("dbo"));
        let fk = RelationalKey::new(
            "orders",
            DatabaseKey::foreign(["user_id"]).named("fk_orders_users"),
            "users",
            DatabaseKey::primary(["id"]),
        );
        let qualified = RelationalKey {
            parent_table: schematic_core::Identifier::with_schema("dbo", "users"),
            ..fk.clone()
        };
        assert!(comparer.equals(&fk, &qualified));
        assert!(!comparer.equals(&fk, &fk.clone().on_delete(ReferentialAction::Cascade)));
    }

    #[test]
    fn test_trigger_comparer_uses_event_set() {
        let a = Trigger::new(
            "tr_a",
            "BEGIN END",
            TriggerTiming::After,
            [TriggerEvent::Insert, TriggerEvent::Update],
        );
        let b = Trigger::new(
            "tr_b",
            "BEGIN END",
            TriggerTiming::After,
            [TriggerEvent::Update, TriggerEvent::Insert],
        );
        assert!(TriggerComparer.equals(&a, &b));

        let before = Trigger {
            timing: TriggerTiming::Before,
            ..a.clone()
        };
        assert!(!TriggerComparer.equals(&a, &before));
    }

    #[test]
    fn test_check_comparer() {
        assert!(CheckComparer.equals(
            &CheckConstraint::new("price > 0").named("ck_a"),
            &CheckConstraint::new(" price > 0 ")
        ));
        assert!(!CheckComparer.equals(
            &CheckConstraint::new("price > 0"),
            &CheckConstraint::new("price >= 0")
        ));
    }
}
