//! Core types shared by the registry and the executor.
//!
//! - State values and their domains via the `State` trait and `Domain`
//! - The `Entity` capability surface the engine reads and writes through
//! - Guard predicates and effect routines, named or inline
//! - `Record`, a map-backed entity for dynamic use

mod effect;
mod entity;
mod guard;
mod record;
mod state;

pub use effect::{Effect, Routine};
pub use entity::{BoxError, Entity, UnknownCapability};
pub use guard::{Guard, Predicate};
pub use record::Record;
pub use state::{Domain, State, StateField};
