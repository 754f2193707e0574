//! Qualified object names.
//!
//! Every named database object is identified by an [`Identifier`]: a local
//! name plus optional schema, database and server qualifiers. Two snapshots
//! of the same database may spell a name with more or fewer qualifiers, so
//! comparisons between snapshots go through [`Identifier::qualify`], which
//! fills the missing components from a set of [`IdentifierDefaults`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised while parsing a dotted identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// One of the dotted components was empty or whitespace.
    #[error("Identifier '{0}' contains an empty component")]
    EmptyComponent(String),

    /// More than four dotted components were given.
    #[error("Identifier '{0}' has more than four components")]
    TooManyComponents(String),
}

/// Default qualifiers applied to identifiers that omit them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierDefaults {
    /// Default server name.
    pub server: Option<String>,
    /// Default database name.
    pub database: Option<String>,
    /// Default schema name.
    pub schema: Option<String>,
}

impl IdentifierDefaults {
    /// Creates empty defaults (identifiers are left as written).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default server.
    #[must_use]
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Sets the default database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the default schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// A possibly-qualified object name.
///
/// Ordering compares server, database, schema and local name in that order,
/// with absent components sorting first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    /// Server name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Object name.
    pub local_name: String,
}

impl Identifier {
    /// Creates an unqualified identifier.
    #[must_use]
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            server: None,
            database: None,
            schema: None,
            local_name: local_name.into(),
        }
    }

    /// Creates a schema-qualified identifier.
    #[must_use]
    pub fn with_schema(schema: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Self::new(local_name)
        }
    }

    /// Creates an identifier from all of its components.
    #[must_use]
    pub fn from_parts(
        server: Option<String>,
        database: Option<String>,
        schema: Option<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            server,
            database,
            schema,
            local_name: local_name.into(),
        }
    }

    /// Parses a dotted name such as `sales.dbo.orders`.
    ///
    /// Components are assigned right to left: the last part is the local
    /// name, then schema, database and server.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is empty or there are more than four.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let parts: Vec<&str> = input.split('.').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(IdentifierError::EmptyComponent(input.to_string()));
        }

        let owned = |s: &&str| (*s).to_string();
        match parts.as_slice() {
            [local] => Ok(Self::new(*local)),
            [schema, local] => Ok(Self::with_schema(*schema, *local)),
            [database, schema, local] => Ok(Self::from_parts(
                None,
                Some(owned(database)),
                Some(owned(schema)),
                *local,
            )),
            [server, database, schema, local] => Ok(Self::from_parts(
                Some(owned(server)),
                Some(owned(database)),
                Some(owned(schema)),
                *local,
            )),
            _ => Err(IdentifierError::TooManyComponents(input.to_string())),
        }
    }

    /// Returns the local (unqualified) name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns this identifier with missing qualifiers filled from `defaults`.
    ///
    /// Components already present are never overwritten.
    #[must_use]
    pub fn qualify(&self, defaults: &IdentifierDefaults) -> Self {
        Self {
            server: self.server.clone().or_else(|| defaults.server.clone()),
            database: self.database.clone().or_else(|| defaults.database.clone()),
            schema: self.schema.clone().or_else(|| defaults.schema.clone()),
            local_name: self.local_name.clone(),
        }
    }

    /// Returns a copy of this identifier with a different local name and the
    /// same qualifiers.
    #[must_use]
    pub fn with_local_name(&self, local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..self.clone()
        }
    }

    /// Returns true if both identifiers name the same object once qualified.
    #[must_use]
    pub fn same_object(&self, other: &Self, defaults: &IdentifierDefaults) -> bool {
        self.qualify(defaults) == other.qualify(defaults)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in [&self.server, &self.database, &self.schema]
            .into_iter()
            .flatten()
        {
            write!(f, "{part}.")?;
        }
        f.write_str(&self.local_name)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
