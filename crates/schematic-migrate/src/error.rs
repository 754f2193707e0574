//! Error types for the migration engine.

use std::path::PathBuf;

use schematic_core::IdentifierError;

use crate::analysis::UnresolvableOperation;
use crate::operations::OperationKind;

/// Errors that can occur while diffing schemas and building migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// No resolver is registered for an operation kind.
    #[error("No resolver registered for {0:?} operations")]
    ResolverNotFound(OperationKind),

    /// No SQL generator is registered for an operation kind.
    #[error("No SQL generator registered for {0:?} operations")]
    GeneratorNotFound(OperationKind),

    /// A schema provider failed to produce a collection.
    #[error("Failed to load schema: {0}")]
    SchemaLoad(String),

    /// IO error (reading/writing snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a snapshot file.
    #[error("Failed to parse snapshot file '{path}': {message}")]
    SnapshotFile {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed identifier.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// An operation cannot be resolved or ordered.
    #[error(transparent)]
    Unresolvable(#[from] UnresolvableOperation),

    /// An operation does not apply to the schema state it was replayed on.
    #[error("Invalid schema state: {0}")]
    InvalidState(String),

    /// The caller cancelled the request.
    #[error("Operation cancelled")]
    Cancelled,

    /// Multiple errors occurred.
    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<MigrateError>),
}

impl MigrateError {
    /// Creates a schema load error.
    pub fn schema_load(msg: impl Into<String>) -> Self {
        Self::SchemaLoad(msg.into())
    }

    /// Returns true for configuration errors: the engine was assembled
    /// without a component it needs, and no input can succeed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ResolverNotFound(_) | Self::GeneratorNotFound(_))
    }
}

impl From<Vec<UnresolvableOperation>> for MigrateError {
    fn from(mut errors: Vec<UnresolvableOperation>) -> Self {
        if errors.len() == 1 {
            Self::Unresolvable(errors.remove(0))
        } else {
            Self::Multiple(errors.into_iter().map(Self::Unresolvable).collect())
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrateError::ResolverNotFound(OperationKind::CreateTable);
        assert!(err.to_string().contains("CreateTable"));
        assert!(err.is_configuration());
        assert!(!MigrateError::Cancelled.is_configuration());
    }

    #[test]
    fn test_multiple_display() {
        let err = MigrateError::Multiple(vec![
            MigrateError::schema_load("tables unavailable"),
            MigrateError::Cancelled,
        ]);
        let msg = err.to_string();
        assert!(msg.contains("  - Failed to load schema: tables unavailable"));
        assert!(msg.contains("  - Operation cancelled"));
    }

    #[test]
    fn test_from_unresolvable_list() {
        use crate::operations::MigrationOperation;

        let one = vec![UnresolvableOperation::new(MigrationOperation::sql("x"), "bad")];
        assert!(matches!(MigrateError::from(one), MigrateError::Unresolvable(_)));

        let two = vec![
            UnresolvableOperation::new(MigrationOperation::sql("x"), "bad"),
            UnresolvableOperation::new(MigrationOperation::sql("y"), "worse"),
        ];
        match MigrateError::from(two) {
            MigrateError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("Expected Multiple, got {other:?}"),
        }
    }
}
