//! Errors returned by `Machine::invoke`.

use crate::core::BoxError;
use crate::registry::ConfigurationError;
use thiserror::Error;

/// An attempt that is not allowed right now.
///
/// Raised when the governed field is unset, holds a state outside the
/// transition's sources, or the guard declines. Recoverable: it describes a
/// business condition, not a fault.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "cannot {event} {entity_type} '{entity}' from {} to '{to}'",
    .from.as_deref().unwrap_or("<unset>")
)]
pub struct TransitionError {
    pub entity_type: String,
    pub entity: String,
    /// `None` when the field was unset.
    pub from: Option<String>,
    pub to: String,
    /// Transition name.
    pub event: String,
}

/// Result of a failed `invoke`.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The transition name was never declared.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Rejected before any mutation; an `invalid` event was published.
    #[error(transparent)]
    Rejected(#[from] TransitionError),

    /// The guard, the effect, a field write or the commit failed; the unit of
    /// work was rolled back and a `failed` event was published. Holds the
    /// original error.
    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl InvokeError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, InvokeError::Rejected(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InvokeError::Failed(_))
    }

    pub fn rejection(&self) -> Option<&TransitionError> {
        match self {
            InvokeError::Rejected(err) => Some(err),
            _ => None,
        }
    }

    /// Downcast the original error behind a `Failed` outcome.
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            InvokeError::Failed(err) => err.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Take the original error behind a `Failed` outcome.
    pub fn into_failure(self) -> Result<BoxError, Self> {
        match self {
            InvokeError::Failed(err) => Ok(err),
            other => Err(other),
        }
    }
}
