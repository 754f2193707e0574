//! Index definitions.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Sort direction of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexColumnOrder {
    /// Ascending (the default).
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

/// One key element of an index: a column or an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column name or expression text.
    pub expression: String,
    /// Sort direction.
    #[serde(default)]
    pub order: IndexColumnOrder,
    /// Columns the expression depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependent_columns: Vec<String>,
}

impl IndexColumn {
    /// Creates an ascending index column over a plain column.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            dependent_columns: vec![column.clone()],
            expression: column,
            order: IndexColumnOrder::Ascending,
        }
    }

    /// Creates an index element over an expression.
    #[must_use]
    pub fn expression<I, S>(expression: impl Into<String>, dependent_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expression: expression.into(),
            order: IndexColumnOrder::Ascending,
            dependent_columns: dependent_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Sorts this element descending.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.order = IndexColumnOrder::Descending;
        self
    }
}

/// An index on a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseIndex {
    /// Index name.
    pub name: Identifier,
    /// Key elements, in order.
    pub columns: Vec<IndexColumn>,
    /// Non-key columns stored in the index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub is_unique: bool,
    /// Whether the index is enabled.
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

const fn enabled() -> bool {
    true
}

impl DatabaseIndex {
    /// Creates a non-unique index over plain columns.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Identifier::new(name),
            columns: columns.into_iter().map(IndexColumn::new).collect(),
            included_columns: Vec::new(),
            is_unique: false,
            is_enabled: true,
        }
    }

    /// Creates an index from explicit key elements.
    #[must_use]
    pub fn from_columns(name: impl Into<String>, columns: Vec<IndexColumn>) -> Self {
        Self {
            name: Identifier::new(name),
            columns,
            included_columns: Vec::new(),
            is_unique: false,
            is_enabled: true,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Adds included (non-key) columns.
    #[must_use]
    pub fn include<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Returns the index's local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    /// Returns every column the index depends on, key and included.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .flat_map(|c| c.dependent_columns.iter())
            .chain(self.included_columns.iter())
            .map(String::as_str)
    }
}
