//! Schema objects other than tables: views, sequences, synonyms, routines.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::identifier::Identifier;
use crate::index::DatabaseIndex;

/// A view (optionally materialized).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct View {
    /// View name.
    pub name: Identifier,
    /// Query text defining the view.
    pub definition: String,
    /// Columns exposed by the view.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    /// Indexes (materialized or indexed views only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<DatabaseIndex>,
    /// Whether the view is materialized.
    #[serde(default)]
    pub is_materialized: bool,
}

impl View {
    /// Creates a plain view.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            is_materialized: false,
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: DatabaseIndex) -> Self {
        self.indexes.push(index);
        self
    }

    /// Marks the view as materialized.
    #[must_use]
    pub fn materialized(mut self) -> Self {
        self.is_materialized = true;
        self
    }
}

/// A numeric sequence generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: Identifier,
    /// First value.
    pub start: i64,
    /// Step between values.
    pub increment: i64,
    /// Lower bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    /// Upper bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    /// Whether the sequence wraps at its bound.
    #[serde(default)]
    pub cycle: bool,
    /// Number of values cached ahead.
    #[serde(default)]
    pub cache_size: u32,
}

impl Sequence {
    /// Creates an unbounded, non-cycling sequence.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, start: i64, increment: i64) -> Self {
        Self {
            name: name.into(),
            start,
            increment,
            min_value: None,
            max_value: None,
            cycle: false,
            cache_size: 0,
        }
    }

    /// Sets the bounds.
    #[must_use]
    pub fn bounds(mut self, min_value: Option<i64>, max_value: Option<i64>) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    /// Makes the sequence cycle.
    #[must_use]
    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Sets the cache size.
    #[must_use]
    pub fn cache(mut self, cache_size: u32) -> Self {
        self.cache_size = cache_size;
        self
    }
}

/// An alias for another database object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Synonym {
    /// Synonym name.
    pub name: Identifier,
    /// Aliased object (database, schema and object name).
    pub target: Identifier,
}

impl Synonym {
    /// Creates a synonym.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, target: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// A stored procedure, function or package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Routine {
    /// Routine name.
    pub name: Identifier,
    /// Full source text.
    pub definition: String,
}

impl Routine {
    /// Creates a routine.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}
