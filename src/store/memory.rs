//! Snapshot-and-restore store kept in process memory.

use super::{Change, Patch, StoreError, UnitOfWork, Work};
use crate::core::{BoxError, Entity};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type Constraint<E> = Box<dyn Fn(&E) -> Result<(), BoxError> + Send + Sync>;

/// In-memory [`UnitOfWork`] with committed rows.
///
/// - Rollback restores a snapshot taken when the unit of work opens.
/// - Commit is optimistic and scoped to the governed field: if the stored
///   row no longer holds the attempt's source state, another writer got
///   there first and the unit of work fails with [`StoreError::Stale`].
/// - Only what the unit of work changed (state, timestamp, effect writes)
///   is patched onto the committed row. Values another writer committed in
///   the meantime survive. Host edits made outside a transition are stored
///   with [`MemoryStore::insert`].
/// - Constraints run against the patched row before it is stored, the way
///   a database validates a row; a failing constraint rolls everything
///   back. Constraints must not call back into the store.
///
/// Rows are keyed by [`Entity::id`]. An entity that was never inserted is
/// committed on its first successful transition, patched onto its own
/// snapshot.
pub struct MemoryStore<E> {
    rows: RwLock<HashMap<String, E>>,
    constraints: Vec<Constraint<E>>,
}

impl<E: Entity + Clone + Patch> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            constraints: Vec::new(),
        }
    }

    /// Add a commit-time check.
    pub fn with_constraint<F>(mut self, constraint: F) -> Self
    where
        F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Store a row as committed, replacing any previous version.
    pub fn insert(&self, entity: &E) {
        self.rows.write().insert(entity.id(), entity.clone());
    }

    /// Committed copy of a row.
    pub fn get(&self, id: &str) -> Option<E> {
        self.rows.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl<E: Entity + Clone + Patch> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity + Clone + Patch> UnitOfWork<E> for MemoryStore<E> {
    fn atomically(&self, entity: &mut E, change: &Change<'_>, work: &mut Work<'_, E>) -> Result<(), BoxError> {
        let snapshot = entity.clone();

        if let Err(err) = work(entity) {
            debug!(entity = %snapshot.id(), field = change.field, "rolling back unit of work");
            *entity = snapshot;
            return Err(err);
        }

        let id = entity.id();
        let mut rows = self.rows.write();
        let mut row = rows.get(&id).cloned().unwrap_or_else(|| snapshot.clone());

        let found = row.state(change.field);
        if found.as_deref() != Some(change.from) {
            drop(rows);
            *entity = snapshot;
            return Err(Box::new(StoreError::Stale {
                entity_type: change.entity_type.to_string(),
                entity: id,
                field: change.field.to_string(),
                expected: change.from.to_string(),
                found,
            }));
        }

        entity.patch(&snapshot, &mut row);
        if let Err(err) = self
            .constraints
            .iter()
            .try_for_each(|constraint| constraint(&row))
        {
            drop(rows);
            debug!(entity = %id, field = change.field, "constraint failed, rolling back");
            *entity = snapshot;
            return Err(err);
        }

        rows.insert(id, row);
        Ok(())
    }
}
