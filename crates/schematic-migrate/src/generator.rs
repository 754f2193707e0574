//! Rendering operations to SQL.
//!
//! Dialects plug in by implementing [`SqlGenerator`] for the operation kinds
//! they support and registering it in a [`SqlGeneratorRegistry`]. No dialect
//! ships with this crate.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::operations::{MigrationOperation, OperationKind};

/// A SQL statement with its named parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlCommand {
    /// Statement text.
    pub sql: String,
    /// Named parameters, by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl SqlCommand {
    /// Creates a command without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a named parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Generates SQL for a migration operation.
pub trait SqlGenerator: Send + Sync {
    /// Returns the commands that apply `operation`.
    fn generate(&self, operation: &MigrationOperation) -> Result<Vec<SqlCommand>>;
}

/// Generator lookup keyed by operation kind.
#[derive(Default)]
pub struct SqlGeneratorRegistry {
    generators: HashMap<OperationKind, Box<dyn SqlGenerator>>,
}

impl fmt::Debug for SqlGeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.generators.keys().collect();
        kinds.sort();
        f.debug_struct("SqlGeneratorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl SqlGeneratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `generator` for `kind`, replacing any previous one.
    pub fn add_generator(&mut self, kind: OperationKind, generator: impl SqlGenerator + 'static) {
        self.generators.insert(kind, Box::new(generator));
    }

    /// Returns the generator for `kind`.
    pub fn generator(&self, kind: OperationKind) -> Result<&dyn SqlGenerator> {
        self.generators
            .get(&kind)
            .map(|generator| &**generator)
            .ok_or(MigrateError::GeneratorNotFound(kind))
    }

    /// Renders a whole migration, in order.
    ///
    /// Fails on the first operation whose kind has no generator.
    pub fn render(&self, operations: &[MigrationOperation]) -> Result<Vec<SqlCommand>> {
        let mut commands = Vec::new();
        for operation in operations {
            let generated = self.generator(operation.kind())?.generate(operation)?;
            tracing::debug!(
                operation = %operation.description(),
                statements = generated.len(),
                "Rendered operation"
            );
            commands.extend(generated);
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawSql;

    impl SqlGenerator for RawSql {
        fn generate(&self, operation: &MigrationOperation) -> Result<Vec<SqlCommand>> {
            match operation {
                MigrationOperation::Sql { sql } => Ok(vec![SqlCommand::new(sql.clone())]),
                other => Err(MigrateError::GeneratorNotFound(other.kind())),
            }
        }
    }

    #[test]
    fn test_render_in_order() {
        let mut registry = SqlGeneratorRegistry::new();
        registry.add_generator(OperationKind::Sql, RawSql);

        let commands = registry
            .render(&[MigrationOperation::sql("SELECT 1"), MigrationOperation::sql("SELECT 2")])
            .unwrap();
        let sql: Vec<&str> = commands.iter().map(|c| c.sql.as_str()).collect();
        assert_eq!(sql, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_missing_generator() {
        let registry = SqlGeneratorRegistry::new();
        let err = registry
            .render(&[MigrationOperation::sql("SELECT 1")])
            .unwrap_err();
        assert!(matches!(err, MigrateError::GeneratorNotFound(OperationKind::Sql)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_command_parameters() {
        let cmd = SqlCommand::new("SELECT :id").parameter("id", "42");
        assert_eq!(cmd.parameters.get("id").map(String::as_str), Some("42"));
    }
}
