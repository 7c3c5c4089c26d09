//! Errors raised while declaring fields and transitions.

use thiserror::Error;

/// A definition that can never succeed.
///
/// Raised synchronously during registry construction and never at
/// invocation time, except for [`ConfigurationError::UnknownTransition`]
/// when a host invokes a name it never declared.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("no state field specified for transition '{transition}' and no default field configured")]
    NoStateField { transition: String },

    #[error("unknown state field '{field}'")]
    UnknownField { field: String },

    #[error("state field '{field}' is already declared")]
    DuplicateField { field: String },

    #[error("state field '{field}' has an empty domain")]
    EmptyDomain { field: String },

    #[error("transition '{transition}' has no target state")]
    MissingTargetState { transition: String },

    #[error("transition '{transition}' has no source states")]
    EmptySourceStates { transition: String },

    #[error("invalid state value '{value}' for field '{field}'")]
    InvalidState { field: String, value: String },

    #[error("duplicate transition name '{name}'")]
    DuplicateTransition { name: String },

    #[error("transition '{name}' is not declared for '{entity_type}'")]
    UnknownTransition { entity_type: String, name: String },

    #[error("could not parse machine definition: {0}")]
    Parse(String),
}
