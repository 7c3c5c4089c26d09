//! One invocation's view of a transition.

use crate::core::BoxError;
use crate::events::{Outcome, TransitionEvent};
use crate::executor::error::TransitionError;
use chrono::Utc;
use uuid::Uuid;

/// Everything an attempt reports, captured before any mutation.
///
/// Lives only for the duration of one `invoke`.
pub(crate) struct Attempt<'a> {
    pub entity_type: &'a str,
    pub entity_id: String,
    pub field: &'a str,
    pub from: Option<String>,
    pub to: &'a str,
    pub event: &'a str,
}

impl Attempt<'_> {
    pub fn event(&self, outcome: Outcome, error: Option<&BoxError>) -> TransitionEvent {
        TransitionEvent {
            id: Uuid::new_v4(),
            entity_type: self.entity_type.to_string(),
            entity_id: self.entity_id.clone(),
            field: self.field.to_string(),
            from: self.from.clone(),
            to: self.to.to_string(),
            event: self.event.to_string(),
            outcome,
            timestamp: Utc::now(),
            error: error.map(|e| e.to_string()),
        }
    }

    pub fn rejection(&self) -> TransitionError {
        TransitionError {
            entity_type: self.entity_type.to_string(),
            entity: self.entity_id.clone(),
            from: self.from.clone(),
            to: self.to.to_string(),
            event: self.event.to_string(),
        }
    }
}
