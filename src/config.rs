//! Declarative machine definitions loaded from YAML or JSON.
//!
//! A [`MachineConfig`] names fields, a default field and transitions. Guards
//! and effects can only be named here; they resolve through
//! [`Entity::predicate`](crate::core::Entity::predicate) and
//! [`Entity::routine`](crate::core::Entity::routine) at call time. Loading
//! goes through the same validated registration path as code-built
//! registries.
//!
//! ```rust
//! use statefield::config::MachineConfig;
//! use statefield::core::Record;
//!
//! let yaml = r#"
//! entity_type: order
//! default_field: status
//! fields:
//!   - name: status
//!     values: [pending, processing, completed]
//! transitions:
//!   - name: process
//!     from: [pending]
//!     to: processing
//!     timestamp: true
//! "#;
//!
//! let registry = MachineConfig::from_yaml(yaml)?.into_registry::<Record>()?;
//! assert!(registry.lookup("process").is_some());
//! # Ok::<(), statefield::registry::ConfigurationError>(())
//! ```

use crate::core::{Domain, Effect, Entity, Guard};
use crate::registry::{ConfigurationError, Registry, RegistryBuilder, Timestamp, TransitionBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineConfig {
    pub entity_type: String,
    #[serde(default)]
    pub default_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionConfig {
    pub name: String,
    pub to: String,
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<TimestampConfig>,
    /// Name of an entity predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Name of an entity routine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

/// `timestamp: true` derives `<to>_at`; a string names the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimestampConfig {
    Enabled(bool),
    Field(String),
}

impl From<TimestampConfig> for Timestamp {
    fn from(config: TimestampConfig) -> Self {
        match config {
            TimestampConfig::Enabled(true) => Timestamp::Derived,
            TimestampConfig::Enabled(false) => Timestamp::None,
            TimestampConfig::Field(field) => Timestamp::Field(field),
        }
    }
}

impl MachineConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Declare everything on a builder, which stays open for inline guards
    /// and further transitions.
    pub fn into_builder<E: Entity>(self) -> Result<RegistryBuilder<E>, ConfigurationError> {
        let mut builder = RegistryBuilder::new(self.entity_type);
        for field in self.fields {
            builder.declare_field(field.name, Domain::new(field.values))?;
        }
        if let Some(field) = self.default_field {
            builder.set_default_field(field)?;
        }
        for transition in self.transitions {
            builder.declare_transition(transition.into_builder())?;
        }
        Ok(builder)
    }

    pub fn into_registry<E: Entity>(self) -> Result<Registry<E>, ConfigurationError> {
        Ok(self.into_builder()?.build())
    }
}

impl TransitionConfig {
    fn into_builder<E: Entity>(self) -> TransitionBuilder<E> {
        let mut builder = TransitionBuilder::new(self.name)
            .from(self.from)
            .to(self.to);
        if let Some(field) = self.field {
            builder = builder.field(field);
        }
        if let Some(timestamp) = self.timestamp {
            builder = builder.with_timestamp(timestamp.into());
        }
        if let Some(guard) = self.guard {
            builder = builder.guard(Guard::named(guard));
        }
        if let Some(effect) = self.effect {
            builder = builder.effect(Effect::named(effect));
        }
        builder
    }
}
