//! The capability surface an entity exposes to the engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for host-supplied code: guards, effects, field writes and
/// commits. The engine never wraps or inspects these; it hands them back
/// to the caller unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A named guard or effect the entity does not provide.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnknownCapability {
    #[error("entity does not provide predicate '{0}'")]
    Predicate(String),

    #[error("entity does not provide routine '{0}'")]
    Routine(String),
}

/// Host object whose state fields are governed by a registry.
///
/// Fields are addressed by name and read or written as symbolic values.
/// Writes only ever receive values that passed domain validation at
/// registration time, but implementations may still refuse them.
///
/// Named predicates and routines let guards and effects be declared by name
/// (for instance from a config file) and resolved against the instance at
/// call time.
pub trait Entity: Send + Sync {
    /// Stable identity used in events and errors.
    fn id(&self) -> String;

    /// Current symbolic value of a governed field, `None` when unset.
    fn state(&self, field: &str) -> Option<String>;

    fn set_state(&mut self, field: &str, value: &str) -> Result<(), BoxError>;

    fn set_timestamp(&mut self, field: &str, at: DateTime<Utc>) -> Result<(), BoxError>;

    /// Evaluate a named predicate.
    fn predicate(&self, name: &str) -> Result<bool, BoxError> {
        Err(Box::new(UnknownCapability::Predicate(name.to_string())))
    }

    /// Run a named routine.
    fn routine(&mut self, name: &str) -> Result<(), BoxError> {
        Err(Box::new(UnknownCapability::Routine(name.to_string())))
    }
}
