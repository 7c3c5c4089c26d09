//! Statefield: an embeddable finite-state transition engine
//!
//! Entities expose one or more named state fields, each drawn from a finite
//! domain. Transitions are declared once per entity type, validated as they
//! are declared and frozen into a [`Registry`]. A [`Machine`] then evaluates
//! and executes them against instances: legality and guards are checked at
//! call time, the state write, timestamp write and effect run as one unit of
//! work, and every attempt publishes exactly one event.
//!
//! # Core Concepts
//!
//! - **Registry**: immutable per-entity-type transition metadata
//! - **Machine**: stateless executor over a registry, a unit of work and a sink
//! - **Events**: `<entity_type>.<transition>.<outcome>` with `success`,
//!   `invalid` or `failed` outcomes
//! - **Store**: the transactional seam; `MemoryStore` is the in-process one
//!
//! # Example
//!
//! ```rust
//! use statefield::core::{Entity, Record};
//! use statefield::events::EventLog;
//! use statefield::state_enum;
//! use statefield::{Machine, MemoryStore, Registry, TransitionBuilder};
//! use std::sync::Arc;
//!
//! state_enum! {
//!     pub enum OrderStatus {
//!         Pending => "pending",
//!         Processing => "processing",
//!         Completed => "completed",
//!     }
//! }
//!
//! let registry = Registry::builder("order")
//!     .state_field::<OrderStatus>("status")?
//!     .default_field("status")?
//!     .transition(
//!         TransitionBuilder::new("process")
//!             .from_states([OrderStatus::Pending])
//!             .to_state(OrderStatus::Processing)
//!             .timestamp(),
//!     )?
//!     .transition(
//!         TransitionBuilder::new("complete")
//!             .from_states([OrderStatus::Processing])
//!             .to_state(OrderStatus::Completed),
//!     )?
//!     .build();
//!
//! let log = Arc::new(EventLog::new());
//! let machine = Machine::new(registry, MemoryStore::new()).with_sink(log.clone());
//!
//! let mut order = Record::new("order-1").with_state("status", "pending");
//! assert!(machine.invoke(&mut order, "complete").is_err());
//! machine.invoke(&mut order, "process")?;
//! machine.invoke(&mut order, "complete")?;
//!
//! assert_eq!(order.state("status").as_deref(), Some("completed"));
//! assert_eq!(
//!     log.names(),
//!     vec![
//!         "order.complete.invalid",
//!         "order.process.success",
//!         "order.complete.success",
//!     ]
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod executor;
pub mod registry;
pub mod store;

pub use config::MachineConfig;
pub use events::{EventSink, Outcome, TransitionEvent};
pub use executor::{InvokeError, Machine, TransitionError, Trigger};
pub use registry::{ConfigurationError, Registry, RegistryBuilder, TransitionBuilder};
pub use store::{MemoryStore, Patch, StoreError, UnitOfWork};
