//! Expansion of coarse operations into the fine-grained ones they need.
//!
//! The differ emits intents such as "create this table". A resolver turns
//! each intent into the operations that make it correct on its own: a table
//! creation becomes the bare table followed by its keys, indexes, checks
//! and triggers. Resolvers are looked up by [`OperationKind`] in a
//! [`ResolverRegistry`], which is built once and passed by reference.

use std::collections::HashMap;
use std::fmt;

use schematic_core::{DatabaseIndex, Identifier, Table, View};

use crate::analysis::UnresolvableOperation;
use crate::error::{MigrateError, Result};
use crate::operations::{MigrationOperation, OperationKind};

/// Expands one operation into the operations required to carry it out.
pub trait OperationResolver: Send + Sync {
    /// Returns the operations that carry out `operation`, in order.
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation>;
}

/// Resolver lookup keyed by operation kind.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<OperationKind, Box<dyn OperationResolver>>,
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.resolvers.keys().collect();
        kinds.sort();
        f.debug_struct("ResolverRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl ResolverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with a resolver for every operation kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in OperationKind::ALL {
            match kind {
                OperationKind::CreateTable => registry.add_resolver(kind, CreateTableResolver),
                OperationKind::DropTable => registry.add_resolver(kind, DropTableResolver),
                OperationKind::CreateView => registry.add_resolver(kind, CreateViewResolver),
                OperationKind::AddForeignKey => registry.add_resolver(kind, ForeignKeyResolver),
                OperationKind::AlterColumn => registry.add_resolver(kind, AlterColumnResolver),
                kind if kind.is_rename() => registry.add_resolver(kind, RenameResolver),
                _ => registry.add_resolver(kind, PassThroughResolver),
            }
        }
        registry
    }

    /// Registers `resolver` for `kind`, replacing any previous one.
    pub fn add_resolver(
        &mut self,
        kind: OperationKind,
        resolver: impl OperationResolver + 'static,
    ) {
        self.resolvers.insert(kind, Box::new(resolver));
    }

    /// Removes the resolver for `kind`.
    pub fn remove_resolver(&mut self, kind: OperationKind) {
        self.resolvers.remove(&kind);
    }

    /// Returns the resolver for `kind`.
    pub fn resolver(&self, kind: OperationKind) -> Result<&dyn OperationResolver> {
        self.resolvers
            .get(&kind)
            .map(|resolver| &**resolver)
            .ok_or(MigrateError::ResolverNotFound(kind))
    }
}

/// Returns the operation unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughResolver;

impl OperationResolver for PassThroughResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        Ok(vec![operation.clone()])
    }
}

/// Splits a table creation into the bare table and its constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateTableResolver;

impl OperationResolver for CreateTableResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        let MigrationOperation::CreateTable { table } = operation else {
            return Ok(vec![operation.clone()]);
        };
        if table.columns.is_empty() {
            return Err(UnresolvableOperation::new(
                operation.clone(),
                format!("Table '{}' has no columns", table.name),
            ));
        }

        let name = &table.name;
        let mut ops = vec![MigrationOperation::CreateTable {
            table: table.columns_only(),
        }];
        ops.extend(table.primary_key.iter().map(|key| MigrationOperation::AddPrimaryKey {
            table: name.clone(),
            key: key.clone(),
        }));
        ops.extend(table.unique_keys.iter().map(|key| MigrationOperation::AddUniqueKey {
            table: name.clone(),
            key: key.clone(),
        }));
        ops.extend(table.checks.iter().map(|check| MigrationOperation::AddCheck {
            table: name.clone(),
            check: check.clone(),
        }));
        ops.extend(table.indexes.iter().map(|index| create_index(name, index)));
        ops.extend(table.triggers.iter().map(|trigger| MigrationOperation::AddTrigger {
            table: name.clone(),
            trigger: trigger.clone(),
        }));
        ops.extend(
            table
                .parent_keys
                .iter()
                .map(|fk| MigrationOperation::AddForeignKey {
                    foreign_key: fk.clone(),
                }),
        );
        Ok(ops)
    }
}

/// Drops a table's constraints, indexes and triggers before the table.
///
/// Most of these drops are moot and removed again by the reducer; the
/// foreign keys are kept when their parent table is dropped too.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropTableResolver;

impl OperationResolver for DropTableResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        let MigrationOperation::DropTable { table } = operation else {
            return Ok(vec![operation.clone()]);
        };
        let mut ops = drop_children(table);
        ops.push(operation.clone());
        Ok(ops)
    }
}

fn drop_children(table: &Table) -> Vec<MigrationOperation> {
    let name = &table.name;
    let mut ops: Vec<MigrationOperation> = table
        .parent_keys
        .iter()
        .map(|fk| MigrationOperation::DropForeignKey {
            foreign_key: fk.clone(),
        })
        .collect();
    ops.extend(table.triggers.iter().map(|trigger| MigrationOperation::DropTrigger {
        table: name.clone(),
        trigger: trigger.clone(),
    }));
    ops.extend(table.indexes.iter().map(|index| MigrationOperation::DropIndex {
        table: name.clone(),
        index: index.clone(),
    }));
    ops.extend(table.checks.iter().map(|check| MigrationOperation::DropCheck {
        table: name.clone(),
        check: check.clone(),
    }));
    ops.extend(table.unique_keys.iter().map(|key| MigrationOperation::DropUniqueKey {
        table: name.clone(),
        key: key.clone(),
    }));
    ops.extend(table.primary_key.iter().map(|key| MigrationOperation::DropPrimaryKey {
        table: name.clone(),
        key: key.clone(),
    }));
    ops
}

/// Splits a view creation into the bare view and its indexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateViewResolver;

impl OperationResolver for CreateViewResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        let MigrationOperation::CreateView { view } = operation else {
            return Ok(vec![operation.clone()]);
        };
        let mut ops = vec![MigrationOperation::CreateView {
            view: View {
                indexes: Vec::new(),
                ..view.clone()
            },
        }];
        ops.extend(view.indexes.iter().map(|index| create_index(&view.name, index)));
        Ok(ops)
    }
}

fn create_index(owner: &Identifier, index: &DatabaseIndex) -> MigrationOperation {
    MigrationOperation::CreateIndex {
        table: owner.clone(),
        index: index.clone(),
    }
}

/// Rejects foreign keys whose child and parent column lists do not line up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeyResolver;

impl OperationResolver for ForeignKeyResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        if let MigrationOperation::AddForeignKey { foreign_key } = operation {
            let child = foreign_key.child_key.columns.len();
            let parent = foreign_key.parent_key.columns.len();
            if child == 0 || child != parent {
                return Err(UnresolvableOperation::new(
                    operation.clone(),
                    format!(
                        "Foreign key has {child} child column(s) but {parent} parent column(s)"
                    ),
                ));
            }
        }
        Ok(vec![operation.clone()])
    }
}

/// Rejects renames to the current name and renames of unnamed constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameResolver;

impl OperationResolver for RenameResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        let new_name = match operation {
            MigrationOperation::RenameTable { new_name, .. }
            | MigrationOperation::RenameColumn { new_name, .. }
            | MigrationOperation::RenamePrimaryKey { new_name, .. }
            | MigrationOperation::RenameUniqueKey { new_name, .. }
            | MigrationOperation::RenameForeignKey { new_name, .. }
            | MigrationOperation::RenameIndex { new_name, .. }
            | MigrationOperation::RenameCheck { new_name, .. } => new_name,
            _ => return Ok(vec![operation.clone()]),
        };

        match operation.subject_name() {
            None => Err(UnresolvableOperation::new(
                operation.clone(),
                "Cannot rename an unnamed object",
            )),
            Some(current) if current == new_name => Err(UnresolvableOperation::new(
                operation.clone(),
                format!("'{current}' is renamed to its own name"),
            )),
            Some(_) => Ok(vec![operation.clone()]),
        }
    }
}

/// Rejects column alterations that would also change the column's name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterColumnResolver;

impl OperationResolver for AlterColumnResolver {
    fn resolve_required_operations(
        &self,
        operation: &MigrationOperation,
    ) -> std::result::Result<Vec<MigrationOperation>, UnresolvableOperation> {
        if let MigrationOperation::AlterColumn {
            existing, target, ..
        } = operation
        {
            if existing.name != target.name {
                return Err(UnresolvableOperation::new(
                    operation.clone(),
                    format!(
                        "Altering column '{}' cannot rename it to '{}'",
                        existing.name, target.name
                    ),
                ));
            }
        }
        Ok(vec![operation.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematic_core::{
        Column, DataType, DatabaseKey, RelationalKey, Trigger, TriggerEvent, TriggerTiming,
    };

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("id", DataType::new("integer")).not_null())
            .column(Column::new("user_id", DataType::new("integer")))
            .primary_key(DatabaseKey::primary(["id"]).named("pk_orders"))
            .unique_key(DatabaseKey::unique(["user_id", "id"]))
            .index(DatabaseIndex::new("ix_orders_user", ["user_id"]))
            .trigger(Trigger::new(
                "tr_orders",
                "BEGIN END",
                TriggerTiming::After,
                [TriggerEvent::Insert],
            ))
            .foreign_key(RelationalKey::new(
                "orders",
                DatabaseKey::foreign(["user_id"]).named("fk_orders_users"),
                "users",
                DatabaseKey::primary(["id"]),
            ))
    }

    fn kinds(ops: &[MigrationOperation]) -> Vec<OperationKind> {
        ops.iter().map(MigrationOperation::kind).collect()
    }

    #[test]
    fn test_default_registry_covers_every_kind() {
        let registry = ResolverRegistry::with_defaults();
        for kind in OperationKind::ALL {
            assert!(registry.resolver(kind).is_ok(), "missing resolver for {kind}");
        }
    }

    #[test]
    fn test_missing_resolver() {
        let mut registry = ResolverRegistry::with_defaults();
        registry.remove_resolver(OperationKind::AddColumn);
        assert!(matches!(
            registry.resolver(OperationKind::AddColumn),
            Err(MigrateError::ResolverNotFound(OperationKind::AddColumn))
        ));
    }

    #[test]
    fn test_create_table_expands_constraints() {
        let op = MigrationOperation::CreateTable { table: orders() };
        let ops = CreateTableResolver.resolve_required_operations(&op).unwrap();

        assert_eq!(
            kinds(&ops),
            vec![
                OperationKind::CreateTable,
                OperationKind::AddPrimaryKey,
                OperationKind::AddUniqueKey,
                OperationKind::CreateIndex,
                OperationKind::AddTrigger,
                OperationKind::AddForeignKey,
            ]
        );
        match &ops[0] {
            MigrationOperation::CreateTable { table } => {
                assert_eq!(table.columns.len(), 2);
                assert!(table.primary_key.is_none());
                assert!(table.parent_keys.is_empty());
            }
            other => panic!("Expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_create_table_without_columns_is_rejected() {
        let op = MigrationOperation::CreateTable {
            table: Table::new("empty"),
        };
        let err = CreateTableResolver.resolve_required_operations(&op).unwrap_err();
        assert!(err.description.contains("no columns"));
    }

    #[test]
    fn test_drop_table_drops_children_first() {
        let op = MigrationOperation::DropTable { table: orders() };
        let ops = DropTableResolver.resolve_required_operations(&op).unwrap();

        assert_eq!(ops.first().map(MigrationOperation::kind), Some(OperationKind::DropForeignKey));
        assert_eq!(ops.last(), Some(&op));
        assert_eq!(ops.len(), 6);
    }

    #[test]
    fn test_create_view_expands_indexes() {
        let view = View::new("v_orders", "SELECT id FROM orders")
            .materialized()
            .index(DatabaseIndex::new("ix_v_orders", ["id"]));
        let op = MigrationOperation::CreateView { view };
        let ops = CreateViewResolver.resolve_required_operations(&op).unwrap();

        assert_eq!(kinds(&ops), vec![OperationKind::CreateView, OperationKind::CreateIndex]);
        assert_eq!(ops[1].owner(), Some(&Identifier::new("v_orders")));
    }

    #[test]
    fn test_foreign_key_column_mismatch() {
        let op = MigrationOperation::AddForeignKey {
            foreign_key: RelationalKey::new(
                "orders",
                DatabaseKey::foreign(["user_id", "tenant_id"]),
                "users",
                DatabaseKey::primary(["id"]),
            ),
        };
        assert!(ForeignKeyResolver.resolve_required_operations(&op).is_err());
    }

    #[test]
    fn test_rename_to_same_name_is_rejected() {
        let op = MigrationOperation::RenameIndex {
            table: Identifier::new("orders"),
            index: DatabaseIndex::new("ix_a", ["id"]),
            new_name: Identifier::new("ix_a"),
        };
        assert!(RenameResolver.resolve_required_operations(&op).is_err());

        let ok = MigrationOperation::RenameIndex {
            table: Identifier::new("orders"),
            index: DatabaseIndex::new("ix_a", ["id"]),
            new_name: Identifier::new("ix_b"),
        };
        assert_eq!(RenameResolver.resolve_required_operations(&ok).unwrap(), vec![ok]);
    }

    #[test]
    fn test_alter_column_name_mismatch() {
        let op = MigrationOperation::AlterColumn {
            table: Identifier::new("orders"),
            existing: Column::new("a", DataType::new("int")),
            target: Column::new("b", DataType::new("int")),
        };
        assert!(AlterColumnResolver.resolve_required_operations(&op).is_err());
    }
}
