//! Terminal events published for every transition attempt.
//!
//! Each call to `Machine::invoke` publishes exactly one [`TransitionEvent`]
//! named `<entity_type>.<transition>.<outcome>` before it returns. Sinks
//! decide what happens next: [`EventBus`] dispatches to subscribers,
//! [`EventLog`] records, [`LoggingSink`] writes tracing output.

mod bus;
mod log;

pub use bus::{EventBus, SubscriptionId};
pub use log::EventLog;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Classification of a transition attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The change was committed.
    Success,
    /// Rejected by source state or guard before any mutation.
    Invalid,
    /// The attempt began and broke: guard error, effect error or commit error.
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Invalid => "invalid",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a terminal event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    /// Governed field the transition targets.
    pub field: String,
    /// Source state, `None` when the field was unset.
    pub from: Option<String>,
    pub to: String,
    /// Transition name.
    pub event: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
    /// Message of the error behind a `failed` outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransitionEvent {
    /// Event name: `<entity_type>.<transition>.<outcome>`.
    pub fn name(&self) -> String {
        format!("{}.{}.{}", self.entity_type, self.event, self.outcome)
    }

    /// Payload as a JSON map.
    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Destination for terminal events.
///
/// `publish` is called exactly once per attempt, synchronously, before the
/// attempt's result is returned to the caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, name: &str, event: &TransitionEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn publish(&self, name: &str, event: &TransitionEvent) {
        (**self).publish(name, event)
    }
}

/// Discards every event.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _name: &str, _event: &TransitionEvent) {}
}

/// Writes every event to `tracing`.
pub struct LoggingSink {
    prefix: String,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self {
            prefix: "[Transition]".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LoggingSink {
    fn publish(&self, name: &str, event: &TransitionEvent) {
        let from = event.from.as_deref().unwrap_or("<unset>");
        match event.outcome {
            Outcome::Success => info!(
                entity = %event.entity_id,
                "{} {}: {} -> {}",
                self.prefix, name, from, event.to
            ),
            Outcome::Invalid | Outcome::Failed => warn!(
                entity = %event.entity_id,
                error = ?event.error,
                "{} {}: {} -> {}",
                self.prefix, name, from, event.to
            ),
        }
    }
}

/// Publishes to several sinks in order.
pub struct FanOut {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanOut {
    fn publish(&self, name: &str, event: &TransitionEvent) {
        for sink in &self.sinks {
            sink.publish(name, event);
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_event(outcome: Outcome) -> TransitionEvent {
    TransitionEvent {
        id: Uuid::new_v4(),
        entity_type: "order".into(),
        entity_id: "order-1".into(),
        field: "status".into(),
        from: Some("pending".into()),
        to: "processing".into(),
        event: "process".into(),
        outcome,
        timestamp: Utc::now(),
        error: None,
    }
}
