//! Column and data type definitions.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Precision and scale of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericPrecision {
    /// Total number of digits.
    pub precision: u32,
    /// Digits after the decimal point.
    pub scale: u32,
}

/// A column's data type as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    /// Type name as written by the dialect (`varchar`, `NUMBER`, ...).
    pub name: String,
    /// Maximum length for character and binary types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Precision and scale for numeric types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<NumericPrecision>,
}

impl DataType {
    /// Creates a type with no length or precision.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length: None,
            precision: None,
        }
    }

    /// Creates a length-constrained type such as `varchar(255)`.
    #[must_use]
    pub fn with_length(name: impl Into<String>, max_length: u32) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::new(name)
        }
    }

    /// Creates a numeric type such as `decimal(10, 2)`.
    #[must_use]
    pub fn with_precision(name: impl Into<String>, precision: u32, scale: u32) -> Self {
        Self {
            precision: Some(NumericPrecision { precision, scale }),
            ..Self::new(name)
        }
    }

    /// Returns the canonical type name used for comparisons.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.name.trim().to_ascii_lowercase()
    }
}

/// Auto-increment (identity) settings of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AutoIncrement {
    /// First generated value.
    pub initial_value: i64,
    /// Step between generated values.
    pub increment: i64,
}

impl Default for AutoIncrement {
    fn default() -> Self {
        Self {
            initial_value: 1,
            increment: 1,
        }
    }
}

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: Identifier,
    /// Data type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Default value expression, as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the column is computed from other columns.
    #[serde(default)]
    pub is_computed: bool,
    /// Auto-increment settings, if the column is an identity column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<AutoIncrement>,
}

impl Column {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Identifier::new(name),
            data_type,
            is_nullable: true,
            default_value: None,
            is_computed: false,
            auto_increment: None,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Marks the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Sets the default value expression.
    #[must_use]
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }

    /// Marks the column as computed.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    /// Makes the column an identity column with the given settings.
    #[must_use]
    pub fn auto_increment(mut self, initial_value: i64, increment: i64) -> Self {
        self.auto_increment = Some(AutoIncrement {
            initial_value,
            increment,
        });
        self.is_nullable = false;
        self
    }

    /// Returns the column's local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = Column::new("id", DataType::new("integer")).auto_increment(1, 1);
        assert_eq!(col.local_name(), "id");
        assert!(!col.is_nullable);
        assert_eq!(col.auto_increment, Some(AutoIncrement::default()));

        let email = Column::new("email", DataType::with_length("varchar", 255))
            .not_null()
            .default_value("''");
        assert_eq!(email.data_type.max_length, Some(255));
        assert_eq!(email.default_value.as_deref(), Some("''"));
    }

    #[test]
    fn test_canonical_type_name() {
        assert_eq!(DataType::new(" VARCHAR ").canonical_name(), "varchar");
        assert_eq!(
            DataType::with_precision("NUMERIC", 10, 2).precision,
            Some(NumericPrecision {
                precision: 10,
                scale: 2
            })
        );
    }
}
