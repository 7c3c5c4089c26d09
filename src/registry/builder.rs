//! Builders that declare fields and transitions and freeze them into a
//! [`Registry`].

use crate::core::{BoxError, Domain, Effect, Entity, Guard, State, StateField};
use crate::registry::definition::{Timestamp, TransitionDef, TransitionName};
use crate::registry::error::ConfigurationError;
use crate::registry::Registry;
use tracing::debug;

/// Builder for one transition declaration with a fluent API.
///
/// Nothing is validated here; the registry builder checks the finished
/// declaration against the field's domain when it is declared.
pub struct TransitionBuilder<E> {
    name: String,
    field: Option<String>,
    from: Vec<String>,
    to: Option<String>,
    timestamp: Timestamp,
    guard: Option<Guard<E>>,
    effect: Option<Effect<E>>,
}

impl<E: Entity> TransitionBuilder<E> {
    /// Start a declaration for the transition `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            from: Vec::new(),
            to: None,
            timestamp: Timestamp::None,
            guard: None,
            effect: None,
        }
    }

    /// Add allowed source states (required, at least one).
    pub fn from<I, V>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.from.extend(states.into_iter().map(Into::into));
        self
    }

    /// Add allowed source states from a [`State`] enum.
    pub fn from_states<S, I>(self, states: I) -> Self
    where
        S: State,
        I: IntoIterator<Item = S>,
    {
        let names: Vec<String> = states.into_iter().map(|s| s.name().to_string()).collect();
        self.from(names)
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.to = Some(state.into());
        self
    }

    pub fn to_state<S: State>(self, state: S) -> Self {
        let name = state.name().to_string();
        self.to(name)
    }

    /// Govern an explicit field instead of the registry's default.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Record success time in `<to>_at`.
    pub fn timestamp(mut self) -> Self {
        self.timestamp = Timestamp::Derived;
        self
    }

    /// Record success time in an explicitly named field.
    pub fn timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp = Timestamp::Field(field.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn guard(mut self, guard: Guard<E>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn effect(mut self, effect: Effect<E>) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Add an effect using a closure.
    pub fn then<F>(mut self, routine: F) -> Self
    where
        F: Fn(&mut E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.effect = Some(Effect::new(routine));
        self
    }
}

/// Mutable setup surface for one entity type.
///
/// Every declaration is validated as it is made and a failed declaration
/// leaves the builder unchanged. [`RegistryBuilder::build`] freezes the
/// result.
///
/// # Example
///
/// ```rust
/// use statefield::core::{Domain, Record};
/// use statefield::registry::{Registry, TransitionBuilder};
///
/// let mut builder = Registry::<Record>::builder("order");
/// builder
///     .declare_field("status", Domain::new(["pending", "processing", "completed"]))
///     .unwrap();
/// builder.set_default_field("status").unwrap();
///
/// let process = builder
///     .declare_transition(
///         TransitionBuilder::new("process")
///             .from(["pending"])
///             .to("processing")
///             .timestamp(),
///     )
///     .unwrap();
///
/// let registry = builder.build();
/// assert_eq!(process.as_str(), "process");
/// assert!(registry.lookup("process").is_some());
/// ```
pub struct RegistryBuilder<E> {
    entity_type: String,
    fields: Vec<StateField>,
    default_field: Option<String>,
    transitions: Vec<TransitionDef<E>>,
}

impl<E: Entity> RegistryBuilder<E> {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
            default_field: None,
            transitions: Vec::new(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Declare a governed field and its domain.
    pub fn declare_field(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if self.fields.iter().any(|f| f.name == name) {
            return Err(ConfigurationError::DuplicateField { field: name });
        }
        if domain.is_empty() {
            return Err(ConfigurationError::EmptyDomain { field: name });
        }

        debug!(
            entity_type = %self.entity_type,
            field = %name,
            values = domain.len(),
            "declared state field"
        );
        self.fields.push(StateField { name, domain });
        Ok(())
    }

    /// Use `name` for every transition that does not name its own field.
    pub fn set_default_field(&mut self, name: impl Into<String>) -> Result<(), ConfigurationError> {
        let name = name.into();
        if !self.fields.iter().any(|f| f.name == name) {
            return Err(ConfigurationError::UnknownField { field: name });
        }
        self.default_field = Some(name);
        Ok(())
    }

    /// Validate and store a transition.
    pub fn declare_transition(
        &mut self,
        transition: TransitionBuilder<E>,
    ) -> Result<TransitionName, ConfigurationError> {
        let TransitionBuilder {
            name,
            field,
            from,
            to,
            timestamp,
            guard,
            effect,
        } = transition;

        let field = field
            .or_else(|| self.default_field.clone())
            .ok_or_else(|| ConfigurationError::NoStateField {
                transition: name.clone(),
            })?;

        let domain = &self
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| ConfigurationError::UnknownField {
                field: field.clone(),
            })?
            .domain;

        let to = to.ok_or_else(|| ConfigurationError::MissingTargetState {
            transition: name.clone(),
        })?;

        if from.is_empty() {
            return Err(ConfigurationError::EmptySourceStates { transition: name });
        }

        if let Some(value) = std::iter::once(&to)
            .chain(from.iter())
            .find(|value| !domain.contains(value))
        {
            return Err(ConfigurationError::InvalidState {
                field,
                value: value.clone(),
            });
        }

        if self.transitions.iter().any(|t| t.name == name) {
            return Err(ConfigurationError::DuplicateTransition { name });
        }

        let mut sources: Vec<String> = Vec::with_capacity(from.len());
        for state in from {
            if !sources.contains(&state) {
                sources.push(state);
            }
        }

        debug!(
            entity_type = %self.entity_type,
            transition = %name,
            field = %field,
            from = ?sources,
            to = %to,
            "declared transition"
        );

        let declared = TransitionName::new(name.clone());
        self.transitions.push(TransitionDef {
            name,
            field,
            from: sources,
            to,
            timestamp,
            guard,
            effect,
        });
        Ok(declared)
    }

    /// Declare a field, consuming and returning the builder.
    pub fn field(mut self, name: impl Into<String>, domain: Domain) -> Result<Self, ConfigurationError> {
        self.declare_field(name, domain)?;
        Ok(self)
    }

    /// Declare a field whose domain is a [`State`] enum.
    pub fn state_field<S: State>(self, name: impl Into<String>) -> Result<Self, ConfigurationError> {
        self.field(name, Domain::of::<S>())
    }

    pub fn default_field(mut self, name: impl Into<String>) -> Result<Self, ConfigurationError> {
        self.set_default_field(name)?;
        Ok(self)
    }

    pub fn transition(mut self, transition: TransitionBuilder<E>) -> Result<Self, ConfigurationError> {
        self.declare_transition(transition)?;
        Ok(self)
    }

    /// Freeze the declarations.
    pub fn build(self) -> Registry<E> {
        Registry::from_parts(
            self.entity_type,
            self.fields,
            self.default_field,
            self.transitions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Record;

    fn order_builder() -> RegistryBuilder<Record> {
        RegistryBuilder::new("order")
            .field("status", Domain::new(["pending", "processing", "completed"]))
            .unwrap()
            .field("payment_status", Domain::new(["unpaid", "paid", "refunded"]))
            .unwrap()
    }

    #[test]
    fn missing_field_without_default_fails() {
        let mut builder = order_builder();
        let result =
            builder.declare_transition(TransitionBuilder::new("process").from(["pending"]).to("processing"));

        assert_eq!(
            result,
            Err(ConfigurationError::NoStateField {
                transition: "process".into()
            })
        );
    }

    #[test]
    fn default_field_is_used_when_none_given() {
        let registry = order_builder()
            .default_field("status")
            .unwrap()
            .transition(TransitionBuilder::new("process").from(["pending"]).to("processing"))
            .unwrap()
            .build();

        assert_eq!(registry.lookup("process").unwrap().field(), "status");
    }

    #[test]
    fn explicit_field_overrides_default() {
        let registry = order_builder()
            .default_field("status")
            .unwrap()
            .transition(
                TransitionBuilder::new("pay")
                    .field("payment_status")
                    .from(["unpaid"])
                    .to("paid"),
            )
            .unwrap()
            .build();

        assert_eq!(registry.lookup("pay").unwrap().field(), "payment_status");
    }

    #[test]
    fn default_field_must_be_declared() {
        let result = order_builder().default_field("shipping_status");
        assert!(matches!(
            result,
            Err(ConfigurationError::UnknownField { field }) if field == "shipping_status"
        ));
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let mut builder = order_builder();
        let result = builder.declare_transition(
            TransitionBuilder::new("ship")
                .field("shipping_status")
                .from(["packed"])
                .to("shipped"),
        );

        assert!(matches!(result, Err(ConfigurationError::UnknownField { .. })));
    }

    #[test]
    fn out_of_domain_target_is_rejected_and_not_stored() {
        let mut builder = order_builder().default_field("status").unwrap();
        let result = builder.declare_transition(
            TransitionBuilder::new("vanish").from(["pending"]).to("nonexistent"),
        );

        assert_eq!(
            result,
            Err(ConfigurationError::InvalidState {
                field: "status".into(),
                value: "nonexistent".into()
            })
        );
        assert!(builder.build().lookup("vanish").is_none());
    }

    #[test]
    fn out_of_domain_source_is_named() {
        let mut builder = order_builder().default_field("status").unwrap();
        let result = builder.declare_transition(
            TransitionBuilder::new("process")
                .from(["pending", "nonexistent"])
                .to("processing"),
        );

        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidState { value, .. }) if value == "nonexistent"
        ));
    }

    #[test]
    fn duplicate_transition_name_fails_fast() {
        let mut builder = order_builder().default_field("status").unwrap();
        builder
            .declare_transition(TransitionBuilder::new("process").from(["pending"]).to("processing"))
            .unwrap();

        let result = builder.declare_transition(
            TransitionBuilder::new("process").from(["processing"]).to("completed"),
        );
        assert_eq!(
            result,
            Err(ConfigurationError::DuplicateTransition {
                name: "process".into()
            })
        );

        let registry = builder.build();
        assert_eq!(registry.lookup("process").unwrap().to_state(), "processing");
    }

    #[test]
    fn empty_sources_are_rejected() {
        let mut builder = order_builder().default_field("status").unwrap();
        let result = builder.declare_transition(TransitionBuilder::new("process").to("processing"));

        assert!(matches!(
            result,
            Err(ConfigurationError::EmptySourceStates { .. })
        ));
    }

    #[test]
    fn missing_target_is_rejected() {
        let mut builder = order_builder().default_field("status").unwrap();
        let result = builder.declare_transition(TransitionBuilder::new("process").from(["pending"]));

        assert!(matches!(
            result,
            Err(ConfigurationError::MissingTargetState { .. })
        ));
    }

    #[test]
    fn duplicate_and_empty_fields_are_rejected() {
        let mut builder = order_builder();
        assert!(matches!(
            builder.declare_field("status", Domain::new(["x"])),
            Err(ConfigurationError::DuplicateField { .. })
        ));
        assert!(matches!(
            builder.declare_field("flags", Domain::new(Vec::<String>::new())),
            Err(ConfigurationError::EmptyDomain { .. })
        ));
    }

    #[test]
    fn repeated_sources_are_stored_once() {
        let registry = order_builder()
            .default_field("status")
            .unwrap()
            .transition(
                TransitionBuilder::new("process")
                    .from(["pending", "pending"])
                    .to("processing"),
            )
            .unwrap()
            .build();

        assert_eq!(registry.lookup("process").unwrap().from_states(), &["pending"]);
    }
}
