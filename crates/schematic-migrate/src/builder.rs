//! Collecting migration intents and turning them into an ordered plan.
//!
//! The differ talks to a [`MigrationBuilder`], one call per intent. The
//! [`RelationalMigrationBuilder`] records those intents in an append-only
//! buffer; [`RelationalMigrationBuilder::build_migrations`] then resolves,
//! reduces and sorts them into the final operation stream.

use futures::stream::{self, Stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use schematic_core::{
    CheckConstraint, Column, DatabaseIndex, DatabaseKey, Identifier, IdentifierDefaults,
    RelationalKey, Routine, Sequence, Synonym, Table, Trigger, View,
};

use crate::analysis::{MigrationAnalysisResult, UnresolvableOperation};
use crate::error::{MigrateError, Result};
use crate::operations::{MigrationOperation, OperationKind};
use crate::reducer::reduce;
use crate::resolver::ResolverRegistry;
use crate::sorter::sort;

/// Receives migration intents.
///
/// Table-scoped methods take the owning table; index methods take the name
/// of the owning table or view.
pub trait MigrationBuilder {
    /// Creates `table` with its columns, keys, indexes, checks and triggers.
    fn create_table(&mut self, table: &Table);
    /// Drops `table`.
    fn drop_table(&mut self, table: &Table);
    /// Renames `table`.
    fn rename_table(&mut self, table: &Table, new_name: &Identifier);

    /// Adds `column` to `table`.
    fn add_column(&mut self, table: &Table, column: &Column);
    /// Drops `column` from `table`.
    fn drop_column(&mut self, table: &Table, column: &Column);
    /// Changes the definition of a column, keeping its name.
    fn alter_column(&mut self, table: &Table, existing: &Column, target: &Column);
    /// Renames `column`.
    fn rename_column(&mut self, table: &Table, column: &Column, new_name: &Identifier);

    /// Adds a primary key.
    fn add_primary_key(&mut self, table: &Table, key: &DatabaseKey);
    /// Drops a primary key.
    fn drop_primary_key(&mut self, table: &Table, key: &DatabaseKey);
    /// Renames a primary key.
    fn rename_primary_key(&mut self, table: &Table, key: &DatabaseKey, new_name: &Identifier);

    /// Adds a unique key.
    fn add_unique_key(&mut self, table: &Table, key: &DatabaseKey);
    /// Drops a unique key.
    fn drop_unique_key(&mut self, table: &Table, key: &DatabaseKey);
    /// Renames a unique key.
    fn rename_unique_key(&mut self, table: &Table, key: &DatabaseKey, new_name: &Identifier);

    /// Adds a foreign key owned by `table`.
    fn add_foreign_key(&mut self, table: &Table, foreign_key: &RelationalKey);
    /// Drops a foreign key owned by `table`.
    fn drop_foreign_key(&mut self, table: &Table, foreign_key: &RelationalKey);
    /// Renames a foreign key.
    fn rename_foreign_key(
        &mut self,
        table: &Table,
        foreign_key: &RelationalKey,
        new_name: &Identifier,
    );

    /// Creates an index on a table or view.
    fn create_index(&mut self, owner: &Identifier, index: &DatabaseIndex);
    /// Drops an index.
    fn drop_index(&mut self, owner: &Identifier, index: &DatabaseIndex);
    /// Renames an index.
    fn rename_index(&mut self, owner: &Identifier, index: &DatabaseIndex, new_name: &Identifier);

    /// Adds a check constraint.
    fn add_check(&mut self, table: &Table, check: &CheckConstraint);
    /// Drops a check constraint.
    fn drop_check(&mut self, table: &Table, check: &CheckConstraint);
    /// Renames a check constraint.
    fn rename_check(&mut self, table: &Table, check: &CheckConstraint, new_name: &Identifier);

    /// Adds a trigger.
    fn add_trigger(&mut self, table: &Table, trigger: &Trigger);
    /// Drops a trigger.
    fn drop_trigger(&mut self, table: &Table, trigger: &Trigger);

    /// Creates `view` with its indexes.
    fn create_view(&mut self, view: &View);
    /// Drops `view`.
    fn drop_view(&mut self, view: &View);

    /// Creates a sequence.
    fn create_sequence(&mut self, sequence: &Sequence);
    /// Drops a sequence.
    fn drop_sequence(&mut self, sequence: &Sequence);
    /// Changes a sequence's settings.
    fn alter_sequence(&mut self, existing: &Sequence, target: &Sequence);

    /// Creates a synonym.
    fn create_synonym(&mut self, synonym: &Synonym);
    /// Drops a synonym.
    fn drop_synonym(&mut self, synonym: &Synonym);

    /// Creates a stored routine.
    fn create_routine(&mut self, routine: &Routine);
    /// Drops a stored routine.
    fn drop_routine(&mut self, routine: &Routine);

    /// Appends raw SQL, run after every schema change.
    fn sql(&mut self, sql: &str);
}

/// Records intents and builds them into an ordered migration.
#[derive(Debug)]
pub struct RelationalMigrationBuilder<'r> {
    registry: &'r ResolverRegistry,
    identifier_defaults: IdentifierDefaults,
    operations: Vec<MigrationOperation>,
}

enum Step<'a> {
    Start(&'a RelationalMigrationBuilder<'a>),
    Yield(std::vec::IntoIter<MigrationOperation>),
    Done,
}

impl<'r> RelationalMigrationBuilder<'r> {
    /// Creates an empty builder that resolves with `registry`.
    #[must_use]
    pub fn new(registry: &'r ResolverRegistry) -> Self {
        Self {
            registry,
            identifier_defaults: IdentifierDefaults::new(),
            operations: Vec::new(),
        }
    }

    /// Sets the defaults used to match table names while reducing and
    /// sorting.
    #[must_use]
    pub fn with_identifier_defaults(mut self, defaults: IdentifierDefaults) -> Self {
        self.identifier_defaults = defaults;
        self
    }

    /// Returns the recorded intents, unresolved, in call order.
    #[must_use]
    pub fn operations(&self) -> &[MigrationOperation] {
        &self.operations
    }

    /// Returns true if no intent was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends an operation.
    pub fn push(&mut self, operation: MigrationOperation) {
        debug!(operation = %operation.description(), "Recorded migration intent");
        self.operations.push(operation);
    }

    /// Resolves, reduces and sorts the recorded intents.
    ///
    /// Operations produced by a resolver are resolved again, so a foreign
    /// key emitted by a table creation is validated like a standalone one.
    /// A missing resolver or a cancelled `cancel` is returned as an error.
    /// Operations that cannot be resolved or ordered are reported as
    /// [`MigrationAnalysisResult::Error`]; no partial plan is produced.
    pub fn plan(&self, cancel: &CancellationToken) -> Result<MigrationAnalysisResult> {
        let mut resolved = Vec::with_capacity(self.operations.len());
        let mut errors = Vec::new();
        for operation in &self.operations {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }
            self.resolve(operation, &mut Vec::new(), &mut resolved, &mut errors)?;
        }
        if !errors.is_empty() {
            return Ok(MigrationAnalysisResult::Error(errors));
        }

        let reduced = reduce(resolved, &self.identifier_defaults);
        match sort(reduced, &self.identifier_defaults) {
            Ok(ordered) => {
                info!(
                    intents = self.operations.len(),
                    operations = ordered.len(),
                    "Built migration"
                );
                Ok(MigrationAnalysisResult::Ok(ordered))
            }
            Err(err) => Ok(MigrationAnalysisResult::Error(vec![err])),
        }
    }

    /// Resolves `operation`, then each operation it expands to. An expanded
    /// operation whose kind is already being resolved on `path` is kept
    /// as is.
    fn resolve(
        &self,
        operation: &MigrationOperation,
        path: &mut Vec<OperationKind>,
        resolved: &mut Vec<MigrationOperation>,
        errors: &mut Vec<UnresolvableOperation>,
    ) -> Result<()> {
        let kind = operation.kind();
        let required = match self
            .registry
            .resolver(kind)?
            .resolve_required_operations(operation)
        {
            Ok(required) => required,
            Err(err) => {
                errors.push(err);
                return Ok(());
            }
        };
        path.push(kind);
        for op in required {
            if path.contains(&op.kind()) {
                resolved.push(op);
            } else {
                self.resolve(&op, path, resolved, errors)?;
            }
        }
        path.pop();
        Ok(())
    }

    /// Streams the ordered migration.
    ///
    /// Planning happens on first poll. Cancellation is checked before every
    /// resolution step and before every yielded operation; a cancelled
    /// stream yields [`MigrateError::Cancelled`] once and ends. Unresolvable
    /// operations are yielded as [`MigrateError::Unresolvable`] (or
    /// [`MigrateError::Multiple`]).
    pub fn build_migrations<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = Result<MigrationOperation>> + 'a {
        let start: Step<'a> = Step::Start(self);
        stream::unfold(start, move |step| async move {
            let mut ops = match step {
                Step::Done => return None,
                Step::Start(builder) => {
                    match builder.plan(cancel).and_then(|result| {
                        result.into_result().map_err(MigrateError::from)
                    }) {
                        Ok(ops) => ops.into_iter(),
                        Err(err) => return Some((Err(err), Step::Done)),
                    }
                }
                Step::Yield(ops) => ops,
            };
            if cancel.is_cancelled() {
                return Some((Err(MigrateError::Cancelled), Step::Done));
            }
            ops.next().map(|op| (Ok(op), Step::Yield(ops)))
        })
    }
}

impl MigrationBuilder for RelationalMigrationBuilder<'_> {
    fn create_table(&mut self, table: &Table) {
        self.push(MigrationOperation::CreateTable {
            table: table.clone(),
        });
    }

    fn drop_table(&mut self, table: &Table) {
        self.push(MigrationOperation::DropTable {
            table: table.clone(),
        });
    }

    fn rename_table(&mut self, table: &Table, new_name: &Identifier) {
        self.push(MigrationOperation::RenameTable {
            table: table.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_column(&mut self, table: &Table, column: &Column) {
        self.push(MigrationOperation::AddColumn {
            table: table.name.clone(),
            column: column.clone(),
        });
    }

    fn drop_column(&mut self, table: &Table, column: &Column) {
        self.push(MigrationOperation::DropColumn {
            table: table.name.clone(),
            column: column.clone(),
        });
    }

    fn alter_column(&mut self, table: &Table, existing: &Column, target: &Column) {
        self.push(MigrationOperation::AlterColumn {
            table: table.name.clone(),
            existing: existing.clone(),
            target: target.clone(),
        });
    }

    fn rename_column(&mut self, table: &Table, column: &Column, new_name: &Identifier) {
        self.push(MigrationOperation::RenameColumn {
            table: table.name.clone(),
            column: column.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_primary_key(&mut self, table: &Table, key: &DatabaseKey) {
        self.push(MigrationOperation::AddPrimaryKey {
            table: table.name.clone(),
            key: key.clone(),
        });
    }

    fn drop_primary_key(&mut self, table: &Table, key: &DatabaseKey) {
        self.push(MigrationOperation::DropPrimaryKey {
            table: table.name.clone(),
            key: key.clone(),
        });
    }

    fn rename_primary_key(&mut self, table: &Table, key: &DatabaseKey, new_name: &Identifier) {
        self.push(MigrationOperation::RenamePrimaryKey {
            table: table.name.clone(),
            key: key.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_unique_key(&mut self, table: &Table, key: &DatabaseKey) {
        self.push(MigrationOperation::AddUniqueKey {
            table: table.name.clone(),
            key: key.clone(),
        });
    }

    fn drop_unique_key(&mut self, table: &Table, key: &DatabaseKey) {
        self.push(MigrationOperation::DropUniqueKey {
            table: table.name.clone(),
            key: key.clone(),
        });
    }

    fn rename_unique_key(&mut self, table: &Table, key: &DatabaseKey, new_name: &Identifier) {
        self.push(MigrationOperation::RenameUniqueKey {
            table: table.name.clone(),
            key: key.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_foreign_key(&mut self, table: &Table, foreign_key: &RelationalKey) {
        self.push(MigrationOperation::AddForeignKey {
            foreign_key: RelationalKey {
                child_table: table.name.clone(),
                ..foreign_key.clone()
            },
        });
    }

    fn drop_foreign_key(&mut self, table: &Table, foreign_key: &RelationalKey) {
        self.push(MigrationOperation::DropForeignKey {
            foreign_key: RelationalKey {
                child_table: table.name.clone(),
                ..foreign_key.clone()
            },
        });
    }

    fn rename_foreign_key(
        &mut self,
        table: &Table,
        foreign_key: &RelationalKey,
        new_name: &Identifier,
    ) {
        self.push(MigrationOperation::RenameForeignKey {
            foreign_key: RelationalKey {
                child_table: table.name.clone(),
                ..foreign_key.clone()
            },
            new_name: new_name.clone(),
        });
    }

    fn create_index(&mut self, owner: &Identifier, index: &DatabaseIndex) {
        self.push(MigrationOperation::CreateIndex {
            table: owner.clone(),
            index: index.clone(),
        });
    }

    fn drop_index(&mut self, owner: &Identifier, index: &DatabaseIndex) {
        self.push(MigrationOperation::DropIndex {
            table: owner.clone(),
            index: index.clone(),
        });
    }

    fn rename_index(&mut self, owner: &Identifier, index: &DatabaseIndex, new_name: &Identifier) {
        self.push(MigrationOperation::RenameIndex {
            table: owner.clone(),
            index: index.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_check(&mut self, table: &Table, check: &CheckConstraint) {
        self.push(MigrationOperation::AddCheck {
            table: table.name.clone(),
            check: check.clone(),
        });
    }

    fn drop_check(&mut self, table: &Table, check: &CheckConstraint) {
        self.push(MigrationOperation::DropCheck {
            table: table.name.clone(),
            check: check.clone(),
        });
    }

    fn rename_check(&mut self, table: &Table, check: &CheckConstraint, new_name: &Identifier) {
        self.push(MigrationOperation::RenameCheck {
            table: table.name.clone(),
            check: check.clone(),
            new_name: new_name.clone(),
        });
    }

    fn add_trigger(&mut self, table: &Table, trigger: &Trigger) {
        self.push(MigrationOperation::AddTrigger {
            table: table.name.clone(),
            trigger: trigger.clone(),
        });
    }

    fn drop_trigger(&mut self, table: &Table, trigger: &Trigger) {
        self.push(MigrationOperation::DropTrigger {
            table: table.name.clone(),
            trigger: trigger.clone(),
        });
    }

    fn create_view(&mut self, view: &View) {
        self.push(MigrationOperation::CreateView { view: view.clone() });
    }

    fn drop_view(&mut self, view: &View) {
        self.push(MigrationOperation::DropView { view: view.clone() });
    }

    fn create_sequence(&mut self, sequence: &Sequence) {
        self.push(MigrationOperation::CreateSequence {
            sequence: sequence.clone(),
        });
    }

    fn drop_sequence(&mut self, sequence: &Sequence) {
        self.push(MigrationOperation::DropSequence {
            sequence: sequence.clone(),
        });
    }

    fn alter_sequence(&mut self, existing: &Sequence, target: &Sequence) {
        self.push(MigrationOperation::AlterSequence {
            existing: existing.clone(),
            target: target.clone(),
        });
    }

    fn create_synonym(&mut self, synonym: &Synonym) {
        self.push(MigrationOperation::CreateSynonym {
            synonym: synonym.clone(),
        });
    }

    fn drop_synonym(&mut self, synonym: &Synonym) {
        self.push(MigrationOperation::DropSynonym {
            synonym: synonym.clone(),
        });
    }

    fn create_routine(&mut self, routine: &Routine) {
        self.push(MigrationOperation::CreateRoutine {
            routine: routine.clone(),
        });
    }

    fn drop_routine(&mut self, routine: &Routine) {
        self.push(MigrationOperation::DropRoutine {
            routine: routine.clone(),
        });
    }

    fn sql(&mut self, sql: &str) {
        self.push(MigrationOperation::sql(sql));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use schematic_core::DataType;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", DataType::new("integer")).not_null())
            .primary_key(DatabaseKey::primary(["id"]).named("pk_users"))
    }

    #[tokio::test]
    async fn test_build_resolves_and_orders() {
        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry);
        builder.sql("INSERT INTO users (id) VALUES (1)");
        builder.create_table(&users());

        let cancel = CancellationToken::new();
        let ops: Vec<_> = builder.build_migrations(&cancel).try_collect().await.unwrap();
        let kinds: Vec<_> = ops.iter().map(MigrationOperation::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::CreateTable,
                OperationKind::AddPrimaryKey,
                OperationKind::Sql
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_build_yields_error_once() {
        use futures::StreamExt;

        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry);
        builder.create_table(&users());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let items: Vec<_> = builder.build_migrations(&cancel).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(MigrateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_missing_resolver_is_fatal() {
        let mut registry = ResolverRegistry::with_defaults();
        registry.remove_resolver(OperationKind::CreateTable);
        let mut builder = RelationalMigrationBuilder::new(&registry);
        builder.create_table(&users());

        let cancel = CancellationToken::new();
        let err = builder
            .build_migrations(&cancel)
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::ResolverNotFound(OperationKind::CreateTable)
        ));
    }

    #[test]
    fn test_plan_reports_unresolvable() {
        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry);
        builder.create_table(&Table::new("empty"));

        let result = builder.plan(&CancellationToken::new()).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_foreign_key_owner_is_builder_table() {
        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry);
        let fk = RelationalKey::new(
            "elsewhere",
            DatabaseKey::foreign(["user_id"]),
            "users",
            DatabaseKey::primary(["id"]),
        );
        builder.add_foreign_key(&Table::new("orders"), &fk);

        assert_eq!(
            builder.operations()[0].owner(),
            Some(&Identifier::new("orders"))
        );
    }

    #[test]
    fn test_created_table_foreign_key_is_validated() {
        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry);
        builder.create_table(&users());
        builder.create_table(
            &Table::new("orders")
                .column(Column::new("id", DataType::new("integer")).not_null())
                .column(Column::new("user_id", DataType::new("integer")))
                .column(Column::new("user_region", DataType::new("integer")))
                .foreign_key(RelationalKey::new(
                    "orders",
                    DatabaseKey::foreign(["user_id", "user_region"]),
                    "users",
                    DatabaseKey::primary(["id"]),
                )),
        );

        let result = builder.plan(&CancellationToken::new()).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.errors()[0].operation.kind(),
            OperationKind::AddForeignKey
        );
    }

    #[test]
    fn test_plan_matches_tables_with_identifier_defaults() {
        let registry = ResolverRegistry::with_defaults();
        let mut builder = RelationalMigrationBuilder::new(&registry)
            .with_identifier_defaults(IdentifierDefaults::new().schema("dbo"));
        let fk = RelationalKey::new(
            "orders",
            DatabaseKey::foreign(["user_id"]),
            Identifier::with_schema("dbo", "users"),
            DatabaseKey::primary(["id"]),
        );
        builder.drop_table(&users());
        builder.drop_table(
            &Table::new("orders")
                .column(Column::new("user_id", DataType::new("integer")))
                .foreign_key(fk),
        );

        let ops = builder.plan(&CancellationToken::new()).unwrap().into_result().unwrap();
        let kinds: Vec<_> = ops.iter().map(MigrationOperation::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::DropForeignKey,
                OperationKind::DropTable,
                OperationKind::DropTable
            ]
        );
        assert_eq!(ops[1], MigrationOperation::DropTable { table: users() });
    }
}
