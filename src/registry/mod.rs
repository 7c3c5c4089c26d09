//! Per-entity-type transition metadata.
//!
//! A [`RegistryBuilder`] collects field and transition declarations,
//! validating each one as it arrives. [`RegistryBuilder::build`] freezes
//! them into a [`Registry`], which exposes no mutation and can be shared
//! freely across threads.

mod builder;
mod definition;
mod error;
pub mod macros;

pub use builder::{RegistryBuilder, TransitionBuilder};
pub use definition::{Timestamp, TransitionDef, TransitionName};
pub use error::ConfigurationError;

use crate::core::{Entity, StateField};
use std::collections::HashMap;

/// Immutable set of fields and transitions for one entity type.
pub struct Registry<E> {
    entity_type: String,
    fields: Vec<StateField>,
    default_field: Option<String>,
    transitions: Vec<TransitionDef<E>>,
    index: HashMap<String, usize>,
}

impl<E: Entity> Registry<E> {
    /// Start declaring the registry for `entity_type`.
    pub fn builder(entity_type: impl Into<String>) -> RegistryBuilder<E> {
        RegistryBuilder::new(entity_type)
    }

    pub(crate) fn from_parts(
        entity_type: String,
        fields: Vec<StateField>,
        default_field: Option<String>,
        transitions: Vec<TransitionDef<E>>,
    ) -> Self {
        let index = transitions
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self {
            entity_type,
            fields,
            default_field,
            transitions,
            index,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn lookup(&self, name: &str) -> Option<&TransitionDef<E>> {
        self.index.get(name).map(|&i| &self.transitions[i])
    }

    pub fn field(&self, name: &str) -> Option<&StateField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[StateField] {
        &self.fields
    }

    pub fn default_field(&self) -> Option<&str> {
        self.default_field.as_deref()
    }

    /// All transitions in declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionDef<E>> {
        self.transitions.iter()
    }

    /// Transitions governing `field`, in declaration order.
    pub fn transitions_for<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a TransitionDef<E>> + 'a {
        self.transitions.iter().filter(move |t| t.field == field)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
