//! Dependency ordering of migration operations.
//!
//! Operations are topologically sorted over explicit dependency edges
//! (a table before its foreign keys, a foreign key drop before its parent's
//! drop, ...). Among operations whose dependencies are satisfied, the one
//! with the lowest phase goes first, then the one that came first in the
//! input, so the output is deterministic and stable.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use schematic_core::{Identifier, IdentifierDefaults, RelationalKey};

use crate::analysis::UnresolvableOperation;
use crate::operations::MigrationOperation;

/// Returns the phase of an operation. Lower phases run first when no edge
/// says otherwise.
#[must_use]
pub const fn phase(op: &MigrationOperation) -> u8 {
    use MigrationOperation as Op;
    match op {
        Op::DropForeignKey { .. } => 0,
        Op::DropPrimaryKey { .. }
        | Op::DropUniqueKey { .. }
        | Op::DropCheck { .. }
        | Op::DropIndex { .. }
        | Op::DropTrigger { .. } => 1,
        Op::DropView { .. } | Op::DropRoutine { .. } | Op::DropSynonym { .. } => 2,
        Op::DropColumn { .. } | Op::DropTable { .. } | Op::DropSequence { .. } => 3,
        Op::RenameTable { .. }
        | Op::RenameColumn { .. }
        | Op::RenamePrimaryKey { .. }
        | Op::RenameUniqueKey { .. }
        | Op::RenameForeignKey { .. }
        | Op::RenameIndex { .. }
        | Op::RenameCheck { .. } => 4,
        Op::CreateSequence { .. }
        | Op::AlterSequence { .. }
        | Op::CreateTable { .. }
        | Op::AddColumn { .. }
        | Op::AlterColumn { .. } => 5,
        Op::AddPrimaryKey { .. } | Op::AddUniqueKey { .. } => 6,
        Op::CreateIndex { .. } | Op::AddCheck { .. } => 7,
        Op::AddForeignKey { .. } => 8,
        Op::AddTrigger { .. }
        | Op::CreateView { .. }
        | Op::CreateRoutine { .. }
        | Op::CreateSynonym { .. } => 9,
        Op::Sql { .. } => 10,
    }
}

/// Orders operations so that every dependency runs before its dependents.
///
/// Table names are compared once qualified with `defaults`. Fails with the
/// first blocked operation if the dependencies are cyclic.
pub fn sort(
    operations: Vec<MigrationOperation>,
    defaults: &IdentifierDefaults,
) -> Result<Vec<MigrationOperation>, UnresolvableOperation> {
    let n = operations.len();
    let graph = Dependencies::new(&operations, defaults);

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for (i, a) in operations.iter().enumerate() {
        for (j, b) in operations.iter().enumerate() {
            if i != j && graph.must_precede(i, a, j, b) {
                successors[i].push(j);
                in_degree[j] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(u8, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(i, _)| Reverse((phase(&operations[i]), i)))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse((_, i))) = ready.pop() {
        order.push(i);
        for &j in &successors[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(Reverse((phase(&operations[j]), j)));
            }
        }
    }

    if order.len() < n {
        let placed: HashSet<usize> = order.iter().copied().collect();
        let blocked = (0..n)
            .filter(|i| !placed.contains(i))
            .min_by_key(|&i| (phase(&operations[i]), i))
            .unwrap_or_default();
        tracing::warn!(
            blocked = n - order.len(),
            "Circular dependency between migration operations"
        );
        return Err(UnresolvableOperation::new(
            operations[blocked].clone(),
            "Circular dependency between migration operations",
        ));
    }

    let mut slots: Vec<Option<MigrationOperation>> = operations.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

/// Identity of the entity an operation creates or removes, used to order a
/// drop before the re-creation of the same entity.
#[derive(Debug, PartialEq, Eq)]
enum Family {
    Table,
    Column,
    PrimaryKey,
    UniqueKey,
    ForeignKey,
    Index,
    Check,
    Trigger,
    View,
    Sequence,
    Synonym,
    Routine,
}

fn family(op: &MigrationOperation) -> Option<Family> {
    use MigrationOperation as Op;
    let family = match op {
        Op::CreateTable { .. } | Op::DropTable { .. } => Family::Table,
        Op::AddColumn { .. } | Op::DropColumn { .. } => Family::Column,
        Op::AddPrimaryKey { .. } | Op::DropPrimaryKey { .. } => Family::PrimaryKey,
        Op::AddUniqueKey { .. } | Op::DropUniqueKey { .. } => Family::UniqueKey,
        Op::AddForeignKey { .. } | Op::DropForeignKey { .. } => Family::ForeignKey,
        Op::CreateIndex { .. } | Op::DropIndex { .. } => Family::Index,
        Op::AddCheck { .. } | Op::DropCheck { .. } => Family::Check,
        Op::AddTrigger { .. } | Op::DropTrigger { .. } => Family::Trigger,
        Op::CreateView { .. } | Op::DropView { .. } => Family::View,
        Op::CreateSequence { .. } | Op::DropSequence { .. } => Family::Sequence,
        Op::CreateSynonym { .. } | Op::DropSynonym { .. } => Family::Synonym,
        Op::CreateRoutine { .. } | Op::DropRoutine { .. } => Family::Routine,
        _ => return None,
    };
    Some(family)
}

const fn is_drop(op: &MigrationOperation) -> bool {
    use MigrationOperation as Op;
    matches!(
        op,
        Op::DropTable { .. }
            | Op::DropColumn { .. }
            | Op::DropPrimaryKey { .. }
            | Op::DropUniqueKey { .. }
            | Op::DropForeignKey { .. }
            | Op::DropIndex { .. }
            | Op::DropCheck { .. }
            | Op::DropTrigger { .. }
            | Op::DropView { .. }
            | Op::DropSequence { .. }
            | Op::DropSynonym { .. }
            | Op::DropRoutine { .. }
    )
}

const fn is_addition(op: &MigrationOperation) -> bool {
    use MigrationOperation as Op;
    matches!(
        op,
        Op::AddColumn { .. }
            | Op::AlterColumn { .. }
            | Op::AddPrimaryKey { .. }
            | Op::AddUniqueKey { .. }
            | Op::AddForeignKey { .. }
            | Op::CreateIndex { .. }
            | Op::AddCheck { .. }
            | Op::AddTrigger { .. }
    )
}

fn qualify_key(key: &RelationalKey, defaults: &IdentifierDefaults) -> RelationalKey {
    RelationalKey {
        child_table: key.child_table.qualify(defaults),
        parent_table: key.parent_table.qualify(defaults),
        ..key.clone()
    }
}

/// Returns true if both names are present and equal.
fn same(a: Option<&Identifier>, b: Option<&Identifier>) -> bool {
    a.is_some() && a == b
}

/// Qualified names of each operation, precomputed for edge building.
struct Dependencies<'a> {
    defaults: &'a IdentifierDefaults,
    owners: Vec<Option<Identifier>>,
    parents: Vec<Option<Identifier>>,
    dropped_fks: HashSet<RelationalKey>,
}

impl<'a> Dependencies<'a> {
    fn new(operations: &[MigrationOperation], defaults: &'a IdentifierDefaults) -> Self {
        let owners = operations
            .iter()
            .map(|op| op.owner().map(|owner| owner.qualify(defaults)))
            .collect();
        let parents = operations
            .iter()
            .map(|op| match op {
                MigrationOperation::AddForeignKey { foreign_key }
                | MigrationOperation::DropForeignKey { foreign_key } => {
                    Some(foreign_key.parent_table.qualify(defaults))
                }
                _ => None,
            })
            .collect();
        let dropped_fks = operations
            .iter()
            .filter_map(|op| match op {
                MigrationOperation::DropForeignKey { foreign_key } => {
                    Some(qualify_key(foreign_key, defaults))
                }
                _ => None,
            })
            .collect();
        Self {
            defaults,
            owners,
            parents,
            dropped_fks,
        }
    }

    fn owner(&self, i: usize) -> Option<&Identifier> {
        self.owners[i].as_ref()
    }

    fn parent(&self, i: usize) -> Option<&Identifier> {
        self.parents[i].as_ref()
    }

    fn same_entity(
        &self,
        i: usize,
        drop: &MigrationOperation,
        j: usize,
        create: &MigrationOperation,
    ) -> bool {
        let Some(kind) = family(drop) else {
            return false;
        };
        if family(create).as_ref() != Some(&kind) {
            return false;
        }
        match (drop.subject_name(), create.subject_name()) {
            (Some(a), Some(b)) => {
                a.same_object(b, self.defaults) && self.owner(i) == self.owner(j)
            }
            _ => false,
        }
    }

    /// Returns true if `a` (at index `i`) must run before `b` (at index `j`).
    fn must_precede(
        &self,
        i: usize,
        a: &MigrationOperation,
        j: usize,
        b: &MigrationOperation,
    ) -> bool {
        use MigrationOperation as Op;

        // Drops scoped to a table or view before the drop of the owner.
        if is_drop(a)
            && !matches!(a, Op::DropTable { .. } | Op::DropView { .. })
            && matches!(b, Op::DropTable { .. } | Op::DropView { .. })
            && same(self.owner(i), self.owner(j))
        {
            return true;
        }

        // Foreign key drops before the drop of the referenced key or table.
        if matches!(a, Op::DropForeignKey { .. })
            && self.owner(i) != self.parent(i)
            && matches!(
                b,
                Op::DropPrimaryKey { .. } | Op::DropUniqueKey { .. } | Op::DropTable { .. }
            )
            && same(self.parent(i), self.owner(j))
        {
            return true;
        }

        // A child table before its parent when their key is not dropped first.
        if let (Op::DropTable { table: child }, Op::DropTable { .. }) = (a, b) {
            let parent = self.owner(j);
            if child.parent_keys.iter().any(|fk| {
                let fk = qualify_key(fk, self.defaults);
                same(Some(&fk.parent_table), parent)
                    && fk.child_table != fk.parent_table
                    && !self.dropped_fks.contains(&fk)
            }) {
                return true;
            }
        }

        // A drop before the re-creation of the same entity.
        if is_drop(a) && !is_drop(b) && self.same_entity(i, a, j, b) {
            return true;
        }

        // Owners before the entities they own.
        if matches!(a, Op::CreateTable { .. } | Op::CreateView { .. })
            && is_addition(b)
            && same(self.owner(i), self.owner(j))
        {
            return true;
        }

        // Referenced tables and keys before the foreign keys that use them.
        if matches!(b, Op::AddForeignKey { .. })
            && matches!(
                a,
                Op::CreateTable { .. } | Op::AddPrimaryKey { .. } | Op::AddUniqueKey { .. }
            )
            && same(self.owner(i), self.parent(j))
        {
            return true;
        }

        // New columns before the keys and indexes over them.
        if matches!(a, Op::AddColumn { .. })
            && matches!(
                b,
                Op::AddPrimaryKey { .. }
                    | Op::AddUniqueKey { .. }
                    | Op::CreateIndex { .. }
                    | Op::AddForeignKey { .. }
                    | Op::AddCheck { .. }
            )
            && same(self.owner(i), self.owner(j))
        {
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::OperationKind;
    use pretty_assertions::assert_eq;
    use schematic_core::{Column, DataType, DatabaseIndex, DatabaseKey, Table};

    fn table(name: &str) -> Table {
        Table::new(name).column(Column::new("id", DataType::new("integer")).not_null())
    }

    fn fk(child: &str, parent: &str) -> RelationalKey {
        RelationalKey::new(
            child,
            DatabaseKey::foreign(["parent_id"]).named(format!("fk_{child}_{parent}")),
            parent,
            DatabaseKey::primary(["id"]),
        )
    }

    fn kinds(ops: &[MigrationOperation]) -> Vec<OperationKind> {
        ops.iter().map(MigrationOperation::kind).collect()
    }

    #[test]
    fn test_parent_created_before_foreign_key() {
        let ops = vec![
            MigrationOperation::AddForeignKey {
                foreign_key: fk("child", "parent"),
            },
            MigrationOperation::CreateTable { table: table("child") },
            MigrationOperation::CreateTable { table: table("parent") },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(
            kinds(&sorted),
            vec![
                OperationKind::CreateTable,
                OperationKind::CreateTable,
                OperationKind::AddForeignKey
            ]
        );
    }

    #[test]
    fn test_foreign_key_dropped_before_parent() {
        let ops = vec![
            MigrationOperation::DropTable { table: table("parent") },
            MigrationOperation::DropTable { table: table("child") },
            MigrationOperation::DropForeignKey {
                foreign_key: fk("child", "parent"),
            },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(sorted[0].kind(), OperationKind::DropForeignKey);
        assert_eq!(sorted[1], MigrationOperation::DropTable { table: table("parent") });
    }

    #[test]
    fn test_child_table_dropped_before_parent_without_key_drop() {
        let child = table("child").foreign_key(fk("child", "parent"));
        let ops = vec![
            MigrationOperation::DropTable { table: table("parent") },
            MigrationOperation::DropTable { table: child.clone() },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(sorted[0], MigrationOperation::DropTable { table: child });
    }

    #[test]
    fn test_mutual_references_are_a_cycle() {
        let a = table("a").foreign_key(fk("a", "b"));
        let b = table("b").foreign_key(fk("b", "a"));
        let ops = vec![
            MigrationOperation::DropTable { table: a },
            MigrationOperation::DropTable { table: b },
        ];
        let err = sort(ops, &IdentifierDefaults::new()).unwrap_err();
        assert!(err.description.contains("Circular"));
        assert_eq!(err.operation.kind(), OperationKind::DropTable);
    }

    #[test]
    fn test_drop_before_recreate() {
        let old = DatabaseIndex::new("ix", ["id"]);
        let new = DatabaseIndex::new("ix", ["id"]).unique();
        let ops = vec![
            MigrationOperation::CreateIndex {
                table: Identifier::new("t"),
                index: new,
            },
            MigrationOperation::DropIndex {
                table: Identifier::new("t"),
                index: old,
            },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(
            kinds(&sorted),
            vec![OperationKind::DropIndex, OperationKind::CreateIndex]
        );
    }

    #[test]
    fn test_stable_within_phase() {
        let ops = vec![
            MigrationOperation::sql("SELECT 1"),
            MigrationOperation::CreateTable { table: table("b") },
            MigrationOperation::CreateTable { table: table("a") },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(sorted[0], MigrationOperation::CreateTable { table: table("b") });
        assert_eq!(sorted[1], MigrationOperation::CreateTable { table: table("a") });
        assert_eq!(sorted[2].kind(), OperationKind::Sql);
    }

    #[test]
    fn test_view_created_before_its_index() {
        let ops = vec![
            MigrationOperation::CreateIndex {
                table: Identifier::new("v"),
                index: DatabaseIndex::new("ix_v", ["id"]),
            },
            MigrationOperation::CreateView {
                view: schematic_core::View::new("v", "SELECT 1 AS id").materialized(),
            },
        ];
        let sorted = sort(ops, &IdentifierDefaults::new()).unwrap();
        assert_eq!(
            kinds(&sorted),
            vec![OperationKind::CreateView, OperationKind::CreateIndex]
        );
    }

    #[test]
    fn test_child_dropped_before_differently_spelled_parent() {
        let defaults = IdentifierDefaults::new().schema("dbo");
        let key = RelationalKey {
            parent_table: Identifier::with_schema("dbo", "parent"),
            ..fk("child", "parent")
        };
        let child = table("child").foreign_key(key);
        let ops = vec![
            MigrationOperation::DropTable { table: table("parent") },
            MigrationOperation::DropTable { table: child.clone() },
        ];
        let sorted = sort(ops, &defaults).unwrap();
        assert_eq!(sorted[0], MigrationOperation::DropTable { table: child });
    }

    #[test]
    fn test_qualified_table_created_before_its_column() {
        let defaults = IdentifierDefaults::new().schema("dbo");
        let ops = vec![
            MigrationOperation::AddColumn {
                table: Identifier::new("t"),
                column: Column::new("name", DataType::new("text")),
            },
            MigrationOperation::CreateTable {
                table: Table::new(Identifier::with_schema("dbo", "t"))
                    .column(Column::new("id", DataType::new("integer")).not_null()),
            },
        ];
        let sorted = sort(ops, &defaults).unwrap();
        assert_eq!(
            kinds(&sorted),
            vec![OperationKind::CreateTable, OperationKind::AddColumn]
        );
    }
}
