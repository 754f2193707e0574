//! Schema providers and materialized snapshots.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use schematic_core::{
    Identifier, IdentifierDefaults, RelationalKey, Routine, Sequence, Synonym, Table, View,
};

use crate::error::{MigrateError, Result};

/// A source of relational schema metadata.
///
/// Every method must be idempotent: calling it twice returns the same
/// entities. Implementations report failures as
/// [`MigrateError::SchemaLoad`]; they are propagated unchanged.
#[async_trait]
pub trait RelationalDatabase: Send + Sync {
    /// Qualifiers applied to names that omit them.
    fn identifier_defaults(&self) -> IdentifierDefaults;

    /// Returns every table.
    async fn tables(&self) -> Result<Vec<Table>>;

    /// Returns every view.
    async fn views(&self) -> Result<Vec<View>>;

    /// Returns every sequence.
    async fn sequences(&self) -> Result<Vec<Sequence>>;

    /// Returns every synonym.
    async fn synonyms(&self) -> Result<Vec<Synonym>>;

    /// Returns every routine.
    async fn routines(&self) -> Result<Vec<Routine>>;
}

/// A fully materialized, read-only schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Qualifiers applied to names that omit them.
    #[serde(default)]
    pub identifier_defaults: IdentifierDefaults,
    /// Tables.
    #[serde(default)]
    pub tables: Vec<Table>,
    /// Views.
    #[serde(default)]
    pub views: Vec<View>,
    /// Sequences.
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    /// Synonyms.
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
    /// Routines.
    #[serde(default)]
    pub routines: Vec<Routine>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
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

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds a view.
    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Adds a sequence.
    #[must_use]
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    /// Adds a synonym.
    #[must_use]
    pub fn synonym(mut self, synonym: Synonym) -> Self {
        self.synonyms.push(synonym);
        self
    }

    /// Adds a routine.
    #[must_use]
    pub fn routine(mut self, routine: Routine) -> Self {
        self.routines.push(routine);
        self
    }

    /// Materializes a provider.
    ///
    /// The five collections are fetched concurrently, each exactly once.
    /// Cancelling `cancel` abandons the fetch with [`MigrateError::Cancelled`].
    pub async fn load(
        database: &dyn RelationalDatabase,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        if cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }

        let fetch = async {
            tokio::try_join!(
                database.tables(),
                database.views(),
                database.sequences(),
                database.synonyms(),
                database.routines(),
            )
        };

        let (tables, views, sequences, synonyms, routines) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(MigrateError::Cancelled),
            collections = fetch => collections?,
        };

        debug!(
            tables = tables.len(),
            views = views.len(),
            sequences = sequences.len(),
            synonyms = synonyms.len(),
            routines = routines.len(),
            "Loaded schema snapshot"
        );

        Ok(Self {
            identifier_defaults: database.identifier_defaults(),
            tables,
            views,
            sequences,
            synonyms,
            routines,
        })
    }

    /// Reads a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| MigrateError::SnapshotFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Finds a table by name, qualifying both sides with this snapshot's
    /// defaults.
    #[must_use]
    pub fn get_table(&self, name: &Identifier) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.same_object(name, &self.identifier_defaults))
    }

    /// Finds a view by name.
    #[must_use]
    pub fn get_view(&self, name: &Identifier) -> Option<&View> {
        self.views
            .iter()
            .find(|v| v.name.same_object(name, &self.identifier_defaults))
    }

    /// Returns the foreign keys that reference `table`, declared on any table
    /// of the snapshot.
    #[must_use]
    pub fn child_keys(&self, table: &Identifier) -> Vec<&RelationalKey> {
        self.tables
            .iter()
            .flat_map(|t| &t.parent_keys)
            .filter(|fk| fk.parent_table.same_object(table, &self.identifier_defaults))
            .collect()
    }
}

#[async_trait]
impl RelationalDatabase for SchemaSnapshot {
    fn identifier_defaults(&self) -> IdentifierDefaults {
        self.identifier_defaults.clone()
    }

    async fn tables(&self) -> Result<Vec<Table>> {
        Ok(self.tables.clone())
    }

    async fn views(&self) -> Result<Vec<View>> {
        Ok(self.views.clone())
    }

    async fn sequences(&self) -> Result<Vec<Sequence>> {
        Ok(self.sequences.clone())
    }

    async fn synonyms(&self) -> Result<Vec<Synonym>> {
        Ok(self.synonyms.clone())
    }

    async fn routines(&self) -> Result<Vec<Routine>> {
        Ok(self.routines.clone())
    }
}
