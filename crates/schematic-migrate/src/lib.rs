//! Schema diffing and migration synthesis for relational databases.
//!
//! `schematic-migrate` compares an existing schema with a target schema and
//! produces the ordered list of operations that turns one into the other:
//! - Differences are detected structurally, so reordering columns or naming a
//!   previously unnamed constraint is not a change
//! - Every high-level change is expanded into the dependent operations it
//!   needs (dropping a table drops the foreign keys that reference it first)
//! - The final list is ordered so that every operation runs after the ones it
//!   depends on
//!
//! # Architecture
//!
//! - **Database** - [`RelationalDatabase`](database::RelationalDatabase)
//!   providers and materialized [`SchemaSnapshot`](database::SchemaSnapshot)s
//! - **Differ** - Walks two snapshots and reports changes to a builder
//! - **Builder** - Collects intents, resolves, reduces and sorts them
//! - **Resolvers** - Expand one intent into the operations it requires
//! - **Generators** - Dialect hooks that render operations to SQL
//! - **State** - Replays operations against a snapshot
//!
//! # Example
//!
//! ```rust
//! use schematic_migrate::prelude::*;
//!
//! let existing = SchemaSnapshot::new().table(
//!     Table::new("users").column(Column::new("id", DataType::new("integer")).not_null()),
//! );
//! let target = SchemaSnapshot::new().table(
//!     Table::new("users")
//!         .column(Column::new("id", DataType::new("integer")).not_null())
//!         .column(Column::new("email", DataType::new("text"))),
//! );
//!
//! let registry = ResolverRegistry::with_defaults();
//! let differ = RelationalDatabaseDiffer::default();
//! assert!(differ.has_differences(&existing, &target, &registry).unwrap());
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the operations that migrate one snapshot to another
//! schematic-migrate diff --existing current.json --target desired.json
//!
//! # Exit non-zero when the schemas differ
//! schematic-migrate check --existing current.json --target desired.json
//! ```

pub mod analysis;
pub mod builder;
pub mod compare;
pub mod database;
pub mod differ;
pub mod error;
pub mod generator;
pub mod lookup;
pub mod operations;
pub mod reducer;
pub mod resolver;
pub mod sorter;
pub mod state;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::analysis::{MigrationAnalysisResult, UnresolvableOperation};
    pub use crate::builder::{MigrationBuilder, RelationalMigrationBuilder};
    pub use crate::compare::Comparer;
    pub use crate::database::{RelationalDatabase, SchemaSnapshot};
    pub use crate::differ::{DifferOptions, RelationalDatabaseDiffer};
    pub use crate::error::{MigrateError, Result};
    pub use crate::generator::{SqlCommand, SqlGenerator, SqlGeneratorRegistry};
    pub use crate::operations::{MigrationOperation, OperationKind};
    pub use crate::resolver::{OperationResolver, ResolverRegistry};
    pub use crate::state::SchemaState;
    pub use schematic_core::{
        CheckConstraint, Column, DataType, DatabaseIndex, DatabaseKey, Identifier,
        IdentifierDefaults, ReferentialAction, RelationalKey, Routine, Sequence, Synonym, Table,
        Trigger, TriggerEvent, TriggerTiming, View,
    };
}
