//! Side-effect routines run inside a transition's unit of work.

use super::entity::{BoxError, Entity};
use std::fmt;
use std::sync::Arc;

/// Inline routine over an entity.
pub type Routine<E> = Arc<dyn Fn(&mut E) -> Result<(), BoxError> + Send + Sync>;

/// Host code run after the state write and before commit.
///
/// The entity already carries the new state value when the effect runs.
/// Returning an error rolls back the whole unit of work, including the
/// state and timestamp writes.
pub enum Effect<E> {
    /// Resolved through [`Entity::routine`].
    Named(String),
    Inline(Routine<E>),
}

impl<E: Entity> Effect<E> {
    pub fn new<F>(routine: F) -> Self
    where
        F: Fn(&mut E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Effect::Inline(Arc::new(routine))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Effect::Named(name.into())
    }

    pub fn run(&self, entity: &mut E) -> Result<(), BoxError> {
        match self {
            Effect::Named(name) => entity.routine(name),
            Effect::Inline(routine) => routine(entity),
        }
    }
}

impl<E> Clone for Effect<E> {
    fn clone(&self) -> Self {
        match self {
            Effect::Named(name) => Effect::Named(name.clone()),
            Effect::Inline(routine) => Effect::Inline(Arc::clone(routine)),
        }
    }
}

impl<E> fmt::Debug for Effect<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Effect::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}
