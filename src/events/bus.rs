//! In-process pub/sub dispatcher keyed by event name.

use super::{EventSink, TransitionEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

type Handler = Arc<dyn Fn(&str, &TransitionEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    pattern: Vec<String>,
    handler: Handler,
}

/// Synchronous dispatcher.
///
/// Patterns are dot-separated like event names. `*` matches exactly one
/// segment and a trailing `**` matches one or more remaining segments, so
/// `order.*.failed` sees every failed order transition and `order.**` sees
/// everything for `order`.
///
/// Handlers run on the publishing thread, outside the subscriber lock, so a
/// handler may subscribe or unsubscribe without deadlocking.
///
/// ```rust
/// use statefield::events::EventBus;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let bus = EventBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = seen.clone();
/// bus.subscribe("order.*.success", move |_, _| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// assert_eq!(bus.subscriber_count(), 1);
/// ```
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &TransitionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            pattern: pattern.split('.').map(str::to_string).collect(),
            handler: Arc::new(handler),
        });
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl EventSink for EventBus {
    fn publish(&self, name: &str, event: &TransitionEvent) {
        let segments: Vec<&str> = name.split('.').collect();
        let handlers: Vec<Handler> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| matches(&s.pattern, &segments))
            .map(|s| Arc::clone(&s.handler))
            .collect();

        trace!(event = name, handlers = handlers.len(), "dispatching");
        for handler in handlers {
            handler(name, event);
        }
    }
}

fn matches(pattern: &[String], name: &[&str]) -> bool {
    match (pattern.split_first(), name.split_first()) {
        (Some((head, _)), Some(_)) if head == "**" && pattern.len() == 1 => true,
        (Some((head, rest)), Some((segment, remaining))) => {
            (head == "*" || head == segment) && matches(rest, remaining)
        }
        (None, None) => true,
        _ => false,
    }
}
