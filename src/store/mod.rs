//! Unit-of-work collaborator and an in-memory reference store.
//!
//! The executor never commits anything itself. It hands the state write,
//! timestamp write and effect to a [`UnitOfWork`] as one closure and relies
//! on the collaborator to make them durable together or not at all.

mod memory;

pub use memory::MemoryStore;

use crate::core::BoxError;
use thiserror::Error;

/// The governed change a unit of work is about to make.
///
/// Stores use this to scope concurrency checks to the governed field
/// instead of the whole entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change<'a> {
    pub entity_type: &'a str,
    pub field: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

/// Work run inside one atomic scope.
pub type Work<'w, E> = dyn FnMut(&mut E) -> Result<(), BoxError> + 'w;

/// Transactional commit/rollback primitive.
///
/// `atomically` runs `work` against the entity and commits the outcome. If
/// `work` or the commit fails, the entity must be left exactly as it was
/// before the call and the error returned unchanged.
pub trait UnitOfWork<E>: Send + Sync {
    fn atomically(&self, entity: &mut E, change: &Change<'_>, work: &mut Work<'_, E>) -> Result<(), BoxError>;
}

/// Rows a [`MemoryStore`] can commit value by value.
///
/// A unit of work writes back only what it changed, so transitions on
/// different fields of the same row never erase each other.
pub trait Patch {
    /// Copy onto `onto` every value `self` changed relative to `since`,
    /// including removals. Values `self` left alone are not touched.
    fn patch(&self, since: &Self, onto: &mut Self);
}

/// Errors raised by [`MemoryStore`] itself.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error(
        "stale {entity_type} '{entity}': field '{field}' is '{}' in the store, expected '{expected}'",
        .found.as_deref().unwrap_or("<unset>")
    )]
    Stale {
        entity_type: String,
        entity: String,
        field: String,
        expected: String,
        found: Option<String>,
    },
}
