//! Trigger definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// When a trigger fires relative to its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    /// Before the statement or row change.
    Before,
    /// After the statement or row change.
    After,
    /// Instead of the change (views).
    InsteadOf,
}

/// Data change that fires a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
}

/// A table trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: Identifier,
    /// Trigger body as reported by the database.
    pub definition: String,
    /// Timing.
    pub timing: TriggerTiming,
    /// Firing events.
    pub events: BTreeSet<TriggerEvent>,
    /// Whether the trigger is enabled.
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

const fn enabled() -> bool {
    true
}

impl Trigger {
    /// Creates an enabled trigger.
    #[must_use]
    pub fn new<I>(
        name: impl Into<String>,
        definition: impl Into<String>,
        timing: TriggerTiming,
        events: I,
    ) -> Self
    where
        I: IntoIterator<Item = TriggerEvent>,
    {
        Self {
            name: Identifier::new(name),
            definition: definition.into(),
            timing,
            events: events.into_iter().collect(),
            is_enabled: true,
        }
    }

    /// Returns the trigger's local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }
}
