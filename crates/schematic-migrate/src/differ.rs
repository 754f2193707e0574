//! Schema comparison.
//!
//! [`RelationalDatabaseDiffer`] walks two snapshots and reports every
//! difference to a [`MigrationBuilder`]. At every level the same steps
//! apply: match entities, emit creations for target-only entities, drops for
//! existing-only entities, and alterations (or drop and re-create) for
//! matched entities whose comparer says they changed. Only tables that
//! changed are recursed into; created and dropped tables are emitted whole.

use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use schematic_core::{DatabaseIndex, Identifier, IdentifierDefaults, Table, View};

use crate::analysis::MigrationAnalysisResult;
use crate::builder::{MigrationBuilder, RelationalMigrationBuilder};
use crate::compare::{
    CheckComparer, ColumnComparer, Comparer, IndexComparer, KeyComparer, RelationalKeyComparer,
    RoutineComparer, SequenceComparer, SynonymComparer, TableComparer, TriggerComparer,
    ViewComparer,
};
use crate::database::{RelationalDatabase, SchemaSnapshot};
use crate::error::{MigrateError, Result};
use crate::lookup::{build_lookup, match_constraints, partition};
use crate::operations::MigrationOperation;
use crate::resolver::ResolverRegistry;

/// Options for the differ.
#[derive(Debug, Clone, Default)]
pub struct DifferOptions {
    /// Qualifiers applied to names that omit them before matching.
    pub identifier_defaults: IdentifierDefaults,
}

impl DifferOptions {
    /// Creates default options: names are matched as written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier defaults.
    #[must_use]
    pub fn with_identifier_defaults(mut self, defaults: IdentifierDefaults) -> Self {
        self.identifier_defaults = defaults;
        self
    }
}

/// Computes the operations that turn one relational schema into another.
#[derive(Debug, Default)]
pub struct RelationalDatabaseDiffer {
    options: DifferOptions,
}

impl RelationalDatabaseDiffer {
    /// Creates a differ.
    #[must_use]
    pub const fn new(options: DifferOptions) -> Self {
        Self { options }
    }

    /// Returns the differ's options.
    #[must_use]
    pub const fn options(&self) -> &DifferOptions {
        &self.options
    }

    fn defaults(&self) -> &IdentifierDefaults {
        &self.options.identifier_defaults
    }

    /// Loads both schemas concurrently, compares them and returns the
    /// ordered migration.
    pub async fn diff(
        &self,
        existing: &dyn RelationalDatabase,
        target: &dyn RelationalDatabase,
        registry: &ResolverRegistry,
        cancel: &CancellationToken,
    ) -> Result<Vec<MigrationOperation>> {
        let (existing, target) = tokio::try_join!(
            SchemaSnapshot::load(existing, cancel),
            SchemaSnapshot::load(target, cancel),
        )?;

        let mut builder = RelationalMigrationBuilder::new(registry)
            .with_identifier_defaults(self.defaults().clone());
        self.get_differences(&existing, &target, &mut builder);
        builder.build_migrations(cancel).try_collect().await
    }

    /// Like [`diff`](Self::diff), but reports unresolvable operations as
    /// [`MigrationAnalysisResult::Error`] instead of failing.
    pub async fn analyze(
        &self,
        existing: &dyn RelationalDatabase,
        target: &dyn RelationalDatabase,
        registry: &ResolverRegistry,
        cancel: &CancellationToken,
    ) -> Result<MigrationAnalysisResult> {
        let (existing, target) = tokio::try_join!(
            SchemaSnapshot::load(existing, cancel),
            SchemaSnapshot::load(target, cancel),
        )?;

        let mut builder = RelationalMigrationBuilder::new(registry)
            .with_identifier_defaults(self.defaults().clone());
        self.get_differences(&existing, &target, &mut builder);
        builder.plan(cancel)
    }

    /// Returns true if migrating `existing` to `target` takes at least one
    /// operation.
    pub fn has_differences(
        &self,
        existing: &SchemaSnapshot,
        target: &SchemaSnapshot,
        registry: &ResolverRegistry,
    ) -> Result<bool> {
        let mut builder = RelationalMigrationBuilder::new(registry)
            .with_identifier_defaults(self.defaults().clone());
        self.get_differences(existing, target, &mut builder);
        if builder.is_empty() {
            return Ok(false);
        }
        let ops = builder
            .plan(&CancellationToken::new())?
            .into_result()
            .map_err(MigrateError::from)?;
        Ok(!ops.is_empty())
    }

    /// Reports every difference between `existing` and `target` to
    /// `builder`.
    pub fn get_differences(
        &self,
        existing: &SchemaSnapshot,
        target: &SchemaSnapshot,
        builder: &mut dyn MigrationBuilder,
    ) {
        self.diff_tables(&existing.tables, &target.tables, builder);
        self.diff_views(&existing.views, &target.views, builder);
        self.diff_sequences(existing, target, builder);
        self.diff_synonyms(existing, target, builder);
        self.diff_routines(existing, target, builder);
    }

    fn diff_tables(
        &self,
        existing: &[Table],
        target: &[Table],
        builder: &mut dyn MigrationBuilder,
    ) {
        let comparer = TableComparer::new(self.defaults().clone());
        let existing = build_lookup(existing, self.defaults(), |t| &t.name);
        let target = build_lookup(target, self.defaults(), |t| &t.name);
        let part = partition(&existing, &target);

        for table in &part.to_create {
            debug!(table = %table.name, "Table created");
            builder.create_table(table);
        }
        for table in &part.to_drop {
            debug!(table = %table.name, "Table dropped");
            builder.drop_table(table);
        }
        let mut altered = 0usize;
        for (current, wanted) in &part.shared {
            if !comparer.equals(current, wanted) {
                debug!(table = %wanted.name, "Table altered");
                altered += 1;
                self.diff_table(current, wanted, builder);
            }
        }

        info!(
            created = part.to_create.len(),
            dropped = part.to_drop.len(),
            altered,
            "Compared tables"
        );
    }

    fn diff_table(&self, existing: &Table, target: &Table, builder: &mut dyn MigrationBuilder) {
        self.diff_checks(existing, target, builder);
        self.diff_columns(existing, target, builder);
        self.diff_foreign_keys(existing, target, builder);
        self.diff_indexes(
            &existing.name,
            &existing.indexes,
            &target.name,
            &target.indexes,
            builder,
        );
        self.diff_primary_key(existing, target, builder);
        self.diff_triggers(existing, target, builder);
        self.diff_unique_keys(existing, target, builder);
    }

    fn diff_checks(&self, existing: &Table, target: &Table, builder: &mut dyn MigrationBuilder) {
        let defaults = self.defaults();
        let matches = match_constraints(
            &existing.checks,
            &target.checks,
            |c| c.name.as_ref().map(|n| n.qualify(defaults)),
            |a, b| CheckComparer.equals(a, b),
        );

        for check in matches.to_create {
            builder.add_check(target, check);
        }
        for check in matches.to_drop {
            builder.drop_check(existing, check);
        }
        for (current, wanted) in matches.matched {
            if !CheckComparer.equals(current, wanted) {
                debug!(table = %target.name, "Check constraint changed");
                builder.drop_check(existing, current);
                builder.add_check(target, wanted);
            } else if let Some(new_name) =
                renamed(current.name.as_ref(), wanted.name.as_ref(), defaults)
            {
                builder.rename_check(target, current, new_name);
            }
        }
    }

    fn diff_columns(&self, existing: &Table, target: &Table, builder: &mut dyn MigrationBuilder) {
        let current = build_lookup(&existing.columns, self.defaults(), |c| &c.name);
        let wanted = build_lookup(&target.columns, self.defaults(), |c| &c.name);
        let part = partition(&current, &wanted);

        for column in part.to_create {
            debug!(table = %target.name, column = %column.name, "Column added");
            builder.add_column(target, column);
        }
        for column in part.to_drop {
            debug!(table = %existing.name, column = %column.name, "Column dropped");
            builder.drop_column(existing, column);
        }
        for (current, wanted) in part.shared {
            if !ColumnComparer.equals(current, wanted) {
                debug!(table = %target.name, column = %wanted.name, "Column altered");
                builder.alter_column(target, current, wanted);
            }
        }
    }

    fn diff_foreign_keys(
        &self,
        existing: &Table,
        target: &Table,
        builder: &mut dyn MigrationBuilder,
    ) {
        let defaults = self.defaults();
        let comparer = RelationalKeyComparer::new(defaults.clone());
        let matches = match_constraints(
            &existing.parent_keys,
            &target.parent_keys,
            |fk| fk.name().map(|n| n.qualify(defaults)),
            |a, b| {
                a.child_key.columns == b.child_key.columns
                    && a.parent_table.same_object(&b.parent_table, defaults)
                    && a.parent_key.columns == b.parent_key.columns
            },
        );

        for fk in matches.to_create {
            builder.add_foreign_key(target, fk);
        }
        for fk in matches.to_drop {
            builder.drop_foreign_key(existing, fk);
        }
        for (current, wanted) in matches.matched {
            if !comparer.equals(current, wanted) {
                debug!(table = %target.name, "Foreign key changed");
                builder.drop_foreign_key(existing, current);
                builder.add_foreign_key(target, wanted);
            } else if let Some(new_name) = renamed(current.name(), wanted.name(), defaults) {
                builder.rename_foreign_key(target, current, new_name);
            }
        }
    }

    fn diff_indexes(
        &self,
        existing_owner: &Identifier,
        existing: &[DatabaseIndex],
        target_owner: &Identifier,
        target: &[DatabaseIndex],
        builder: &mut dyn MigrationBuilder,
    ) {
        let defaults = self.defaults();
        let matches = match_constraints(
            existing,
            target,
            |i| Some(i.name.qualify(defaults)),
            |a, b| IndexComparer.equals(a, b),
        );

        for index in matches.to_create {
            builder.create_index(target_owner, index);
        }
        for index in matches.to_drop {
            builder.drop_index(existing_owner, index);
        }
        for (current, wanted) in matches.matched {
            if !IndexComparer.equals(current, wanted) {
                debug!(owner = %target_owner, index = %wanted.name, "Index changed");
                builder.drop_index(existing_owner, current);
                builder.create_index(target_owner, wanted);
            } else if let Some(new_name) =
                renamed(Some(&current.name), Some(&wanted.name), defaults)
            {
                builder.rename_index(target_owner, current, new_name);
            }
        }
    }

    fn diff_primary_key(
        &self,
        existing: &Table,
        target: &Table,
        builder: &mut dyn MigrationBuilder,
    ) {
        match (&existing.primary_key, &target.primary_key) {
            (None, Some(key)) => builder.add_primary_key(target, key),
            (Some(key), None) => builder.drop_primary_key(existing, key),
            (Some(current), Some(wanted)) if !KeyComparer.equals(current, wanted) => {
                builder.drop_primary_key(existing, current);
                builder.add_primary_key(target, wanted);
            }
            (Some(current), Some(wanted)) => {
                let defaults = self.defaults();
                if let Some(new_name) =
                    renamed(current.name.as_ref(), wanted.name.as_ref(), defaults)
                {
                    builder.rename_primary_key(target, current, new_name);
                }
            }
            (None, None) => {}
        }
    }

    fn diff_triggers(&self, existing: &Table, target: &Table, builder: &mut dyn MigrationBuilder) {
        let current = build_lookup(&existing.triggers, self.defaults(), |t| &t.name);
        let wanted = build_lookup(&target.triggers, self.defaults(), |t| &t.name);
        let part = partition(&current, &wanted);

        for trigger in part.to_create {
            builder.add_trigger(target, trigger);
        }
        for trigger in part.to_drop {
            builder.drop_trigger(existing, trigger);
        }
        for (current, wanted) in part.shared {
            if !TriggerComparer.equals(current, wanted) {
                debug!(table = %target.name, trigger = %wanted.name, "Trigger changed");
                builder.drop_trigger(existing, current);
                builder.add_trigger(target, wanted);
            }
        }
    }

    fn diff_unique_keys(
        &self,
        existing: &Table,
        target: &Table,
        builder: &mut dyn MigrationBuilder,
    ) {
        let defaults = self.defaults();
        let matches = match_constraints(
            &existing.unique_keys,
            &target.unique_keys,
            |k| k.name.as_ref().map(|n| n.qualify(defaults)),
            |a, b| a.columns == b.columns,
        );

        for key in matches.to_create {
            builder.add_unique_key(target, key);
        }
        for key in matches.to_drop {
            builder.drop_unique_key(existing, key);
        }
        for (current, wanted) in matches.matched {
            if !KeyComparer.equals(current, wanted) {
                debug!(table = %target.name, "Unique key changed");
                builder.drop_unique_key(existing, current);
                builder.add_unique_key(target, wanted);
            } else if let Some(new_name) =
                renamed(current.name.as_ref(), wanted.name.as_ref(), defaults)
            {
                builder.rename_unique_key(target, current, new_name);
            }
        }
    }

    fn diff_views(&self, existing: &[View], target: &[View], builder: &mut dyn MigrationBuilder) {
        let existing = build_lookup(existing, self.defaults(), |v| &v.name);
        let target = build_lookup(target, self.defaults(), |v| &v.name);
        let part = partition(&existing, &target);

        for view in &part.to_create {
            builder.create_view(view);
        }
        for view in &part.to_drop {
            builder.drop_view(view);
        }
        let mut altered = 0usize;
        for (current, wanted) in &part.shared {
            if ViewComparer.equals(current, wanted) {
                self.diff_indexes(
                    &current.name,
                    &current.indexes,
                    &wanted.name,
                    &wanted.indexes,
                    builder,
                );
            } else {
                debug!(view = %wanted.name, "View changed");
                altered += 1;
                builder.drop_view(current);
                builder.create_view(wanted);
            }
        }

        info!(
            created = part.to_create.len(),
            dropped = part.to_drop.len(),
            altered,
            "Compared views"
        );
    }

    fn diff_sequences(
        &self,
        existing: &SchemaSnapshot,
        target: &SchemaSnapshot,
        builder: &mut dyn MigrationBuilder,
    ) {
        let current = build_lookup(&existing.sequences, self.defaults(), |s| &s.name);
        let wanted = build_lookup(&target.sequences, self.defaults(), |s| &s.name);
        let part = partition(&current, &wanted);

        for sequence in &part.to_create {
            builder.create_sequence(sequence);
        }
        for sequence in &part.to_drop {
            builder.drop_sequence(sequence);
        }
        let mut altered = 0usize;
        for (current, wanted) in &part.shared {
            if !SequenceComparer.equals(current, wanted) {
                altered += 1;
                builder.alter_sequence(current, wanted);
            }
        }

        info!(
            created = part.to_create.len(),
            dropped = part.to_drop.len(),
            altered,
            "Compared sequences"
        );
    }

    fn diff_synonyms(
        &self,
        existing: &SchemaSnapshot,
        target: &SchemaSnapshot,
        builder: &mut dyn MigrationBuilder,
    ) {
        let comparer = SynonymComparer::new(self.defaults().clone());
        let current = build_lookup(&existing.synonyms, self.defaults(), |s| &s.name);
        let wanted = build_lookup(&target.synonyms, self.defaults(), |s| &s.name);
        let part = partition(&current, &wanted);

        for synonym in &part.to_create {
            builder.create_synonym(synonym);
        }
        for synonym in &part.to_drop {
            builder.drop_synonym(synonym);
        }
        let mut altered = 0usize;
        for (current, wanted) in &part.shared {
            if !comparer.equals(current, wanted) {
                altered += 1;
                builder.drop_synonym(current);
                builder.create_synonym(wanted);
            }
        }

        info!(
            created = part.to_create.len(),
            dropped = part.to_drop.len(),
            altered,
            "Compared synonyms"
        );
    }

    fn diff_routines(
        &self,
        existing: &SchemaSnapshot,
        target: &SchemaSnapshot,
        builder: &mut dyn MigrationBuilder,
    ) {
        let current = build_lookup(&existing.routines, self.defaults(), |r| &r.name);
        let wanted = build_lookup(&target.routines, self.defaults(), |r| &r.name);
        let part = partition(&current, &wanted);

        for routine in &part.to_create {
            builder.create_routine(routine);
        }
        for routine in &part.to_drop {
            builder.drop_routine(routine);
        }
        let mut altered = 0usize;
        for (current, wanted) in &part.shared {
            if !RoutineComparer.equals(current, wanted) {
                altered += 1;
                builder.drop_routine(current);
                builder.create_routine(wanted);
            }
        }

        info!(
            created = part.to_create.len(),
            dropped = part.to_drop.len(),
            altered,
            "Compared routines"
        );
    }
}

/// Returns the new name when both names are present and differ.
fn renamed<'a>(
    current: Option<&Identifier>,
    wanted: Option<&'a Identifier>,
    defaults: &IdentifierDefaults,
) -> Option<&'a Identifier> {
    match (current, wanted) {
        (Some(current), Some(wanted)) if !current.same_object(wanted, defaults) => Some(wanted),
        _ => None,
    }
}
