use schematic_core::{Identifier, IdentifierDefaults, Table};

use super::keys::{
    CheckComparer, ColumnComparer, IndexComparer, KeyComparer, RelationalKeyComparer,
    TriggerComparer,
};
use super::{same_elements, Comparer};

/// Compares whole tables.
///
/// Unlike the member comparers this one includes member names: a table
/// whose only change is a renamed constraint is unequal, so the differ
/// recurses into it and emits the rename. It is only used to decide
/// whether to recurse.
#[derive(Debug, Clone, Default)]
pub struct TableComparer {
    defaults: IdentifierDefaults,
}

impl TableComparer {
    /// Creates a comparer that qualifies names with `defaults`.
    #[must_use]
    pub const fn new(defaults: IdentifierDefaults) -> Self {
        Self { defaults }
    }

    fn same_name(&self, a: &Identifier, b: &Identifier) -> bool {
        a.same_object(b, &self.defaults)
    }

    fn same_optional_name(&self, a: Option<&Identifier>, b: Option<&Identifier>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.same_name(a, b),
            _ => false,
        }
    }
}

impl Comparer<Table> for TableComparer {
    fn equals(&self, a: &Table, b: &Table) -> bool {
        let foreign_keys = RelationalKeyComparer::new(self.defaults.clone());

        let checks = same_elements(&a.checks, &b.checks, |x, y| {
            self.same_optional_name(x.name.as_ref(), y.name.as_ref()) && CheckComparer.equals(x, y)
        });
        let columns = same_elements(&a.columns, &b.columns, |x, y| {
            self.same_name(&x.name, &y.name) && ColumnComparer.equals(x, y)
        });
        let parent_keys = same_elements(&a.parent_keys, &b.parent_keys, |x, y| {
            self.same_optional_name(x.name(), y.name()) && foreign_keys.equals(x, y)
        });
        let indexes = same_elements(&a.indexes, &b.indexes, |x, y| {
            self.same_name(&x.name, &y.name) && IndexComparer.equals(x, y)
        });
        let primary_key = match (&a.primary_key, &b.primary_key) {
            (None, None) => true,
            (Some(x), Some(y)) => {
                self.same_optional_name(x.name.as_ref(), y.name.as_ref())
                    && KeyComparer.equals(x, y)
            }
            _ => false,
        };
        let triggers = same_elements(&a.triggers, &b.triggers, |x, y| {
            self.same_name(&x.name, &y.name) && TriggerComparer.equals(x, y)
        });
        let unique_keys = same_elements(&a.unique_keys, &b.unique_keys, |x, y| {
            self.same_optional_name(x.name.as_ref(), y.name.as_ref()) && KeyComparer.equals(x, y)
        });

        checks && columns && parent_keys && indexes && primary_key && triggers && unique_keys
    }
}
