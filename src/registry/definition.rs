//! Frozen transition definitions.

use crate::core::{Effect, Entity, Guard};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a successful transition records its wall-clock time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    #[default]
    None,
    /// `<to>_at`, derived from the target state.
    Derived,
    /// An explicitly named field.
    Field(String),
}

impl Timestamp {
    /// Resolve the field to write for a transition into `to`.
    pub fn target(&self, to: &str) -> Option<String> {
        match self {
            Timestamp::None => None,
            Timestamp::Derived => Some(format!("{}_at", to)),
            Timestamp::Field(field) => Some(field.clone()),
        }
    }
}

/// Name handed back by a successful declaration.
///
/// Bind it to a machine with `Machine::trigger` to get a per-name handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionName(String);

impl TransitionName {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TransitionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, immutable transition rule.
///
/// Only the registry builder constructs these, after checking every state
/// against the governed field's domain.
pub struct TransitionDef<E> {
    pub(crate) name: String,
    pub(crate) field: String,
    pub(crate) from: Vec<String>,
    pub(crate) to: String,
    pub(crate) timestamp: Timestamp,
    pub(crate) guard: Option<Guard<E>>,
    pub(crate) effect: Option<Effect<E>>,
}

impl<E: Entity> TransitionDef<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn from_states(&self) -> &[String] {
        &self.from
    }

    pub fn to_state(&self) -> &str {
        &self.to
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Field the timestamp is written to, if any.
    pub fn timestamp_target(&self) -> Option<String> {
        self.timestamp.target(&self.to)
    }

    pub fn guard(&self) -> Option<&Guard<E>> {
        self.guard.as_ref()
    }

    pub fn effect(&self) -> Option<&Effect<E>> {
        self.effect.as_ref()
    }

    /// Whether `state` is an allowed source (pure).
    pub fn permits_source(&self, state: &str) -> bool {
        self.from.iter().any(|s| s == state)
    }
}

impl<E> fmt::Debug for TransitionDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDef")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("timestamp", &self.timestamp)
            .field("guard", &self.guard)
            .field("effect", &self.effect)
            .finish()
    }
}
