//! Guard predicates for controlling transitions.
//!
//! A guard gates a transition beyond the legality of its source state. It
//! is either a reference to a predicate the entity provides by name, or an
//! inline closure. Both are resolved against the instance at call time.

use super::entity::{BoxError, Entity};
use std::fmt;
use std::sync::Arc;

/// Inline predicate over an entity.
pub type Predicate<E> = Arc<dyn Fn(&E) -> Result<bool, BoxError> + Send + Sync>;

/// Predicate that determines if a transition may fire.
///
/// Guards must be side-effect free. They receive a shared reference, so
/// they cannot mutate the entity, and are expected to be fast and to
/// succeed under normal conditions; an error is handed back to the caller.
///
/// # Example
///
/// ```rust
/// use statefield::core::{Guard, Record};
///
/// let paid = Guard::new(|order: &Record| {
///     order.attribute("paid").and_then(|v| v.as_bool()) == Some(true)
/// });
///
/// let mut order = Record::new("order-1");
/// assert!(!paid.check(&order).unwrap());
///
/// order.set_attribute("paid", true);
/// assert!(paid.check(&order).unwrap());
/// ```
pub enum Guard<E> {
    /// Resolved through [`Entity::predicate`].
    Named(String),
    Inline(Predicate<E>),
}

impl<E: Entity> Guard<E> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Guard::Inline(Arc::new(move |entity| Ok(predicate(entity))))
    }

    /// Create a guard from a predicate that may fail.
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Guard::Inline(Arc::new(predicate))
    }

    /// Refer to a predicate the entity provides by name.
    pub fn named(name: impl Into<String>) -> Self {
        Guard::Named(name.into())
    }

    /// Evaluate the guard against an instance.
    pub fn check(&self, entity: &E) -> Result<bool, BoxError> {
        match self {
            Guard::Named(name) => entity.predicate(name),
            Guard::Inline(predicate) => predicate(entity),
        }
    }
}

impl<E> Clone for Guard<E> {
    fn clone(&self) -> Self {
        match self {
            Guard::Named(name) => Guard::Named(name.clone()),
            Guard::Inline(predicate) => Guard::Inline(Arc::clone(predicate)),
        }
    }
}

impl<E> fmt::Debug for Guard<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Guard::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}
