//! In-memory record of published events.

use super::{EventSink, Outcome, TransitionEvent};
use parking_lot::Mutex;
use std::time::Duration;

/// Sink that keeps every event it receives, in publish order.
///
/// Useful for tests and for hosts that want a local audit trail; the engine
/// itself never persists attempts.
#[derive(Default)]
pub struct EventLog {
    entries: Mutex<Vec<(String, TransitionEvent)>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransitionEvent> {
        self.entries.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Names the events were published under.
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn last(&self) -> Option<TransitionEvent> {
        self.entries.lock().last().map(|(_, e)| e.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn for_entity(&self, entity_id: &str) -> Vec<TransitionEvent> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| e.entity_id == entity_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| e.outcome == outcome)
            .count()
    }

    /// States one entity's field moved through, from successful events.
    ///
    /// Starts with the first recorded source state, then each target.
    pub fn path(&self, entity_id: &str, field: &str) -> Vec<String> {
        let entries = self.entries.lock();
        let mut successes = entries
            .iter()
            .map(|(_, e)| e)
            .filter(|e| e.entity_id == entity_id && e.field == field && e.outcome == Outcome::Success)
            .peekable();

        let mut path = Vec::new();
        if let Some(from) = successes.peek().and_then(|e| e.from.clone()) {
            path.push(from);
        }
        path.extend(successes.map(|e| e.to.clone()));
        path
    }

    /// Time between the first and last recorded event.
    pub fn duration(&self) -> Option<Duration> {
        let entries = self.entries.lock();
        let (first, last) = (entries.first()?, entries.last()?);
        last.1
            .timestamp
            .signed_duration_since(first.1.timestamp)
            .to_std()
            .ok()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl EventSink for EventLog {
    fn publish(&self, name: &str, event: &TransitionEvent) {
        self.entries.lock().push((name.to_string(), event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::sample_event;

    fn publish(log: &EventLog, event: TransitionEvent) {
        log.publish(&event.name(), &event);
    }

    #[test]
    fn new_log_is_empty() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert!(log.last().is_none());
        assert!(log.duration().is_none());
    }

    #[test]
    fn publish_records_name_and_event() {
        let log = EventLog::new();
        publish(&log, sample_event(Outcome::Success));

        assert_eq!(log.names(), vec!["order.process.success"]);
        assert_eq!(log.last().unwrap().outcome, Outcome::Success);
    }

    #[test]
    fn count_groups_by_outcome() {
        let log = EventLog::new();
        publish(&log, sample_event(Outcome::Success));
        publish(&log, sample_event(Outcome::Invalid));
        publish(&log, sample_event(Outcome::Invalid));

        assert_eq!(log.count(Outcome::Success), 1);
        assert_eq!(log.count(Outcome::Invalid), 2);
        assert_eq!(log.count(Outcome::Failed), 0);
    }

    #[test]
    fn path_follows_successful_transitions() {
        let log = EventLog::new();
        publish(&log, sample_event(Outcome::Success));

        let mut rejected = sample_event(Outcome::Invalid);
        rejected.from = Some("processing".into());
        rejected.to = "pending".into();
        publish(&log, rejected);

        let mut complete = sample_event(Outcome::Success);
        complete.from = Some("processing".into());
        complete.to = "completed".into();
        complete.event = "complete".into();
        publish(&log, complete);

        assert_eq!(
            log.path("order-1", "status"),
            vec!["pending", "processing", "completed"]
        );
        assert!(log.path("order-2", "status").is_empty());
    }

    #[test]
    fn for_entity_filters_by_id() {
        let log = EventLog::new();
        publish(&log, sample_event(Outcome::Success));

        let mut other = sample_event(Outcome::Success);
        other.entity_id = "order-2".into();
        publish(&log, other);

        assert_eq!(log.for_entity("order-2").len(), 1);
        log.clear();
        assert!(log.is_empty());
    }
}
