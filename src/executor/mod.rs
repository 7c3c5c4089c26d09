//! Runs declared transitions against entity instances.
//!
//! A [`Machine`] pairs a frozen [`Registry`] with a [`UnitOfWork`] and an
//! [`EventSink`]. It keeps no per-entity state: every call reads the
//! governed field fresh, decides, and hands any mutation to the unit of
//! work.
//!
//! # Outcomes
//!
//! Every `invoke` on a declared transition publishes exactly one event
//! before returning:
//!
//! - `success`: the state write, timestamp write and effect committed.
//! - `invalid`: the field was unset, held a state outside the sources, or
//!   the guard returned `false`. Nothing was mutated.
//! - `failed`: the guard returned an error, or the effect, a field write or
//!   the commit failed. The unit of work was rolled back.
//!
//! # Example
//!
//! ```rust
//! use statefield::core::{Domain, Entity, Record};
//! use statefield::events::EventLog;
//! use statefield::executor::Machine;
//! use statefield::registry::{Registry, TransitionBuilder};
//! use statefield::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let registry = Registry::builder("order")
//!     .field("status", Domain::new(["pending", "processing", "completed"]))?
//!     .default_field("status")?
//!     .transition(TransitionBuilder::new("process").from(["pending"]).to("processing").timestamp())?
//!     .build();
//!
//! let log = Arc::new(EventLog::new());
//! let machine = Machine::new(registry, MemoryStore::new()).with_sink(log.clone());
//!
//! let mut order = Record::new("order-1").with_state("status", "pending");
//! machine.invoke(&mut order, "process")?;
//!
//! assert_eq!(order.state("status").as_deref(), Some("processing"));
//! assert!(order.timestamp("processing_at").is_some());
//! assert_eq!(log.names(), vec!["order.process.success"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attempt;
mod error;
mod trigger;

pub use error::{InvokeError, TransitionError};
pub use trigger::Trigger;

use crate::core::{BoxError, Entity};
use crate::events::{EventSink, NoopSink, Outcome};
use crate::registry::{ConfigurationError, Registry, TransitionDef};
use crate::store::{Change, UnitOfWork};
use attempt::Attempt;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stateless executor over one entity type's registry.
///
/// Cloning is cheap and clones share the registry, store and sink. The
/// machine takes no locks of its own; concurrent calls only contend inside
/// the unit of work.
pub struct Machine<E> {
    registry: Arc<Registry<E>>,
    store: Arc<dyn UnitOfWork<E>>,
    sink: Arc<dyn EventSink>,
}

impl<E> Clone for Machine<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<E: Entity + 'static> Machine<E> {
    /// Create a machine that publishes nowhere until a sink is set.
    pub fn new<U>(registry: Registry<E>, store: U) -> Self
    where
        U: UnitOfWork<E> + 'static,
    {
        Self::from_shared(Arc::new(registry), Arc::new(store))
    }

    /// Create a machine over an already shared registry and store.
    pub fn from_shared(registry: Arc<Registry<E>>, store: Arc<dyn UnitOfWork<E>>) -> Self {
        Self {
            registry,
            store,
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: EventSink + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    pub fn registry(&self) -> &Registry<E> {
        &self.registry
    }

    /// Whether `name` could fire right now.
    ///
    /// `Ok(false)` for undeclared names and unset fields. Never mutates the
    /// entity and publishes nothing; a guard error is returned as `Err`.
    pub fn can_transition(&self, entity: &E, name: &str) -> Result<bool, BoxError> {
        match self.registry.lookup(name) {
            Some(def) => Self::permits(def, entity),
            None => Ok(false),
        }
    }

    /// Names of every transition that could fire right now, in declaration
    /// order.
    pub fn permitted_transitions(&self, entity: &E) -> Result<Vec<&str>, BoxError> {
        self.registry
            .transitions()
            .filter_map(|def| match Self::permits(def, entity) {
                Ok(true) => Some(Ok(def.name())),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            })
            .collect()
    }

    /// Bind a declared transition to this machine.
    pub fn trigger(&self, name: impl AsRef<str>) -> Option<Trigger<'_, E>> {
        self.registry
            .lookup(name.as_ref())
            .map(|def| Trigger::new(self, def))
    }

    /// Run the transition `name` against `entity`.
    pub fn invoke(&self, entity: &mut E, name: &str) -> Result<(), InvokeError> {
        let def = self.registry.lookup(name).ok_or_else(|| {
            ConfigurationError::UnknownTransition {
                entity_type: self.registry.entity_type().to_string(),
                name: name.to_string(),
            }
        })?;

        let attempt = Attempt {
            entity_type: self.registry.entity_type(),
            entity_id: entity.id(),
            field: def.field(),
            from: entity.state(def.field()),
            to: def.to_state(),
            event: def.name(),
        };

        debug!(
            entity_type = attempt.entity_type,
            entity = %attempt.entity_id,
            transition = attempt.event,
            field = attempt.field,
            from = ?attempt.from,
            to = attempt.to,
            "attempting transition"
        );

        let current = match attempt.from.as_deref() {
            Some(state) if def.permits_source(state) => state.to_string(),
            _ => return Err(self.reject(&attempt)),
        };

        if let Some(guard) = def.guard() {
            match guard.check(entity) {
                Ok(true) => {}
                Ok(false) => return Err(self.reject(&attempt)),
                Err(err) => return Err(self.fail(&attempt, err)),
            }
        }

        let change = Change {
            entity_type: attempt.entity_type,
            field: def.field(),
            from: &current,
            to: def.to_state(),
        };
        let timestamp = def.timestamp_target();
        let committed = self.store.atomically(entity, &change, &mut |entity: &mut E| -> Result<(), BoxError> {
            entity.set_state(def.field(), def.to_state())?;
            if let Some(field) = &timestamp {
                entity.set_timestamp(field, Utc::now())?;
            }
            if let Some(effect) = def.effect() {
                effect.run(entity)?;
            }
            Ok(())
        });

        match committed {
            Ok(()) => {
                let event = attempt.event(Outcome::Success, None);
                self.sink.publish(&event.name(), &event);
                info!(
                    entity_type = attempt.entity_type,
                    entity = %attempt.entity_id,
                    transition = attempt.event,
                    from = %current,
                    to = attempt.to,
                    "transition committed"
                );
                Ok(())
            }
            Err(err) => Err(self.fail(&attempt, err)),
        }
    }

    fn permits(def: &TransitionDef<E>, entity: &E) -> Result<bool, BoxError> {
        match entity.state(def.field()) {
            Some(state) if def.permits_source(&state) => {}
            _ => return Ok(false),
        }
        match def.guard() {
            Some(guard) => guard.check(entity),
            None => Ok(true),
        }
    }

    fn reject(&self, attempt: &Attempt<'_>) -> InvokeError {
        let event = attempt.event(Outcome::Invalid, None);
        self.sink.publish(&event.name(), &event);
        warn!(
            entity_type = attempt.entity_type,
            entity = %attempt.entity_id,
            transition = attempt.event,
            from = ?attempt.from,
            to = attempt.to,
            "transition rejected"
        );
        InvokeError::Rejected(attempt.rejection())
    }

    fn fail(&self, attempt: &Attempt<'_>, err: BoxError) -> InvokeError {
        let event = attempt.event(Outcome::Failed, Some(&err));
        self.sink.publish(&event.name(), &event);
        warn!(
            entity_type = attempt.entity_type,
            entity = %attempt.entity_id,
            transition = attempt.event,
            error = %err,
            "transition failed"
        );
        InvokeError::Failed(err)
    }
}
