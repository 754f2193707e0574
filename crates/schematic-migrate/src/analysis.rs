//! Outcome of planning a migration.

use serde::{Deserialize, Serialize};

use crate::operations::MigrationOperation;

/// An operation that could not be expanded or ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Unresolvable operation ({}): {description}", .operation.description())]
pub struct UnresolvableOperation {
    /// Why the operation cannot be resolved.
    pub description: String,
    /// The offending operation.
    pub operation: MigrationOperation,
}

impl UnresolvableOperation {
    /// Creates a new unresolvable operation.
    pub fn new(operation: MigrationOperation, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            operation,
        }
    }
}

/// Result of analyzing the migration between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationAnalysisResult {
    /// The ordered operations.
    Ok(Vec<MigrationOperation>),
    /// Operations that could not be resolved. No partial plan is returned.
    Error(Vec<UnresolvableOperation>),
}

impl MigrationAnalysisResult {
    /// Returns true if the analysis produced a plan.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the ordered operations.
    ///
    /// # Panics
    ///
    /// Panics if the analysis failed. Check [`is_ok`](Self::is_ok) first.
    #[must_use]
    pub fn operations(&self) -> &[MigrationOperation] {
        match self {
            Self::Ok(ops) => ops,
            Self::Error(errors) => panic!(
                "operations() called on a failed analysis with {} error(s)",
                errors.len()
            ),
        }
    }

    /// Returns the errors of a failed analysis, or an empty slice.
    #[must_use]
    pub fn errors(&self) -> &[UnresolvableOperation] {
        match self {
            Self::Ok(_) => &[],
            Self::Error(errors) => errors,
        }
    }

    /// Converts into a standard result.
    pub fn into_result(self) -> Result<Vec<MigrationOperation>, Vec<UnresolvableOperation>> {
        match self {
            Self::Ok(ops) => Ok(ops),
            Self::Error(errors) => Err(errors),
        }
    }
}
