//! End-to-end transition lifecycles through the public API.

use chrono::{DateTime, Utc};
use statefield::config::MachineConfig;
use statefield::core::{BoxError, Domain, Entity, Guard, Record, State, UnknownCapability};
use statefield::events::{EventBus, EventLog, FanOut};
use statefield::state_enum;
use statefield::store::StoreError;
use statefield::{
    ConfigurationError, EventSink, InvokeError, Machine, MemoryStore, Outcome, Patch, Registry,
    TransitionBuilder,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn order_registry() -> Registry<Record> {
    Registry::builder("order")
        .field("status", Domain::new(["pending", "processing", "shipped", "completed"]))
        .unwrap()
        .field("payment_status", Domain::new(["unpaid", "paid", "refunded"]))
        .unwrap()
        .default_field("status")
        .unwrap()
        .transition(
            TransitionBuilder::new("process")
                .from(["pending"])
                .to("processing")
                .timestamp(),
        )
        .unwrap()
        .transition(
            TransitionBuilder::new("ship")
                .from(["processing"])
                .to("shipped")
                .timestamp_field("dispatchedAt"),
        )
        .unwrap()
        .transition(
            TransitionBuilder::new("complete")
                .from(["processing", "shipped"])
                .to("completed"),
        )
        .unwrap()
        .transition(
            TransitionBuilder::new("pay")
                .field("payment_status")
                .from(["unpaid"])
                .to("paid")
                .timestamp(),
        )
        .unwrap()
        .transition(
            TransitionBuilder::new("refund")
                .field("payment_status")
                .from(["paid"])
                .to("refunded"),
        )
        .unwrap()
        .build()
}

fn order_machine() -> (Machine<Record>, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    let machine = Machine::new(order_registry(), MemoryStore::new()).with_sink(log.clone());
    (machine, log)
}

fn pending_order(id: &str) -> Record {
    Record::new(id)
        .with_state("status", "pending")
        .with_state("payment_status", "unpaid")
}

#[test]
fn pending_processing_completed_scenario() {
    let (machine, log) = order_machine();
    let mut order = pending_order("o1");

    let before = Utc::now();
    machine.invoke(&mut order, "process").unwrap();
    let after = Utc::now();

    assert_eq!(order.state("status").as_deref(), Some("processing"));
    let stamped = order.timestamp("processing_at").unwrap();
    assert!(before <= stamped && stamped <= after);

    let err = machine.invoke(&mut order, "process").unwrap_err();
    assert_eq!(err.rejection().unwrap().from.as_deref(), Some("processing"));

    machine.invoke(&mut order, "complete").unwrap();
    assert_eq!(order.state("status").as_deref(), Some("completed"));
    assert!(order.timestamp("completed_at").is_none());

    assert_eq!(
        log.names(),
        vec![
            "order.process.success",
            "order.process.invalid",
            "order.complete.success",
        ]
    );
    assert_eq!(log.path("o1", "status"), vec!["pending", "processing", "completed"]);
}

#[test]
fn explicit_timestamp_field() {
    let (machine, _) = order_machine();
    let mut order = pending_order("o1");

    machine.invoke(&mut order, "process").unwrap();
    machine.invoke(&mut order, "ship").unwrap();

    assert!(order.timestamp("dispatchedAt").is_some());
    assert!(order.timestamp("shipped_at").is_none());
}

#[test]
fn fields_are_independent() {
    let (machine, log) = order_machine();
    let mut order = pending_order("o1");

    machine.invoke(&mut order, "pay").unwrap();
    assert_eq!(order.state("payment_status").as_deref(), Some("paid"));
    assert_eq!(order.state("status").as_deref(), Some("pending"));
    assert!(order.timestamp("paid_at").is_some());

    machine.invoke(&mut order, "process").unwrap();
    machine.invoke(&mut order, "refund").unwrap();
    assert_eq!(order.state("status").as_deref(), Some("processing"));
    assert_eq!(order.state("payment_status").as_deref(), Some("refunded"));

    let fields: Vec<String> = log.events().into_iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["payment_status", "status", "payment_status"]);
}

#[test]
fn fields_are_independent_across_copies_of_one_row() {
    let store = Arc::new(MemoryStore::<Record>::new());
    let log = Arc::new(EventLog::new());
    let machine = Machine::from_shared(Arc::new(order_registry()), store.clone())
        .with_sink(log.clone());

    let order = pending_order("o1");
    store.insert(&order);
    let (mut paying, mut processing) = (order.clone(), order);

    machine.invoke(&mut paying, "pay").unwrap();
    machine.invoke(&mut processing, "process").unwrap();

    let row = store.get("o1").unwrap();
    assert_eq!(row.state("status").as_deref(), Some("processing"));
    assert_eq!(row.state("payment_status").as_deref(), Some("paid"));
    assert!(row.timestamp("paid_at").is_some());
    assert!(row.timestamp("processing_at").is_some());
    assert_eq!(log.count(Outcome::Success), 2);
}

#[test]
fn fields_are_independent_across_threads() {
    let store = Arc::new(MemoryStore::<Record>::new());
    let machine = Machine::from_shared(Arc::new(order_registry()), store.clone());
    let order = pending_order("o1");
    store.insert(&order);

    std::thread::scope(|scope| {
        for transition in ["pay", "process"] {
            let (machine, mut copy) = (&machine, order.clone());
            scope.spawn(move || machine.invoke(&mut copy, transition).unwrap());
        }
    });

    let row = store.get("o1").unwrap();
    assert_eq!(row.state("status").as_deref(), Some("processing"));
    assert_eq!(row.state("payment_status").as_deref(), Some("paid"));
}

#[test]
fn permitted_transitions_follow_state() {
    let (machine, _) = order_machine();
    let mut order = pending_order("o1");

    assert_eq!(machine.permitted_transitions(&order).unwrap(), vec!["process", "pay"]);

    machine.invoke(&mut order, "process").unwrap();
    assert_eq!(
        machine.permitted_transitions(&order).unwrap(),
        vec!["ship", "complete", "pay"]
    );
}

#[test]
fn effect_failure_is_atomic() {
    let registry = Registry::builder("order")
        .field("status", Domain::new(["pending", "processing"]))
        .unwrap()
        .default_field("status")
        .unwrap()
        .transition(
            TransitionBuilder::new("process")
                .from(["pending"])
                .to("processing")
                .timestamp()
                .then(|order: &mut Record| {
                    order.set_attribute("reserved", true);
                    Err("inventory service timed out".into())
                }),
        )
        .unwrap()
        .build();
    let log = Arc::new(EventLog::new());
    let store = MemoryStore::new();
    let machine = Machine::new(registry, store).with_sink(log.clone());
    let mut order = Record::new("o1").with_state("status", "pending");

    let err = machine.invoke(&mut order, "process").unwrap_err();

    assert!(err.is_failed());
    assert_eq!(err.to_string(), "inventory service timed out");
    assert_eq!(order.state("status").as_deref(), Some("pending"));
    assert!(order.timestamp("processing_at").is_none());
    assert!(order.attribute("reserved").is_none());

    let event = log.last().unwrap();
    assert_eq!(event.outcome, Outcome::Failed);
    assert_eq!(event.error.as_deref(), Some("inventory service timed out"));
    assert_eq!(log.len(), 1);
}

#[test]
fn guard_error_publishes_failed() {
    let registry = Registry::builder("order")
        .field("status", Domain::new(["pending", "processing"]))
        .unwrap()
        .default_field("status")
        .unwrap()
        .transition(
            TransitionBuilder::new("process")
                .from(["pending"])
                .to("processing")
                .guard(Guard::fallible(|_: &Record| Err("fraud check unavailable".into()))),
        )
        .unwrap()
        .build();
    let log = Arc::new(EventLog::new());
    let machine = Machine::new(registry, MemoryStore::new()).with_sink(log.clone());
    let mut order = Record::new("o1").with_state("status", "pending");

    let err = machine.invoke(&mut order, "process").unwrap_err();

    assert!(err.is_failed());
    assert_eq!(log.names(), vec!["order.process.failed"]);
    assert_eq!(order.state("status").as_deref(), Some("pending"));
}

#[test]
fn named_guard_on_record_is_unknown_capability() {
    let registry = Registry::builder("order")
        .field("status", Domain::new(["pending", "processing"]))
        .unwrap()
        .default_field("status")
        .unwrap()
        .transition(
            TransitionBuilder::new("process")
                .from(["pending"])
                .to("processing")
                .guard(Guard::named("in_stock")),
        )
        .unwrap()
        .build();
    let machine = Machine::new(registry, MemoryStore::new());
    let mut order = Record::new("o1").with_state("status", "pending");

    let err = machine.invoke(&mut order, "process").unwrap_err();

    assert_eq!(
        err.downcast_ref::<UnknownCapability>(),
        Some(&UnknownCapability::Predicate("in_stock".into()))
    );
}

#[test]
fn stale_commit_fails() {
    let log = Arc::new(EventLog::new());
    let store = Arc::new(MemoryStore::<Record>::new());
    let machine = Machine::from_shared(Arc::new(order_registry()), store.clone())
        .with_sink(log.clone());

    let mut first = pending_order("o1");
    store.insert(&first);
    let mut second = first.clone();

    machine.invoke(&mut first, "process").unwrap();
    let err = machine.invoke(&mut second, "process").unwrap_err();

    match err.downcast_ref::<StoreError>() {
        Some(StoreError::Stale { expected, found, .. }) => {
            assert_eq!(expected, "pending");
            assert_eq!(found.as_deref(), Some("processing"));
        }
        other => panic!("expected stale error, got {:?}", other),
    }
    assert_eq!(second.state("status").as_deref(), Some("pending"));
    assert_eq!(log.count(Outcome::Failed), 1);
    assert_eq!(
        store.get("o1").unwrap().state("status").as_deref(),
        Some("processing")
    );
}

#[test]
fn commit_constraint_rolls_back() {
    let store = MemoryStore::new().with_constraint(|order: &Record| {
        match (order.state("status").as_deref(), order.attribute("address")) {
            (Some("shipped"), None) => Err("shipped orders need an address".into()),
            _ => Ok(()),
        }
    });
    let store = Arc::new(store);
    let log = Arc::new(EventLog::new());
    let machine = Machine::from_shared(Arc::new(order_registry()), store.clone())
        .with_sink(log.clone());
    let mut order = pending_order("o1");

    machine.invoke(&mut order, "process").unwrap();
    let err = machine.invoke(&mut order, "ship").unwrap_err();

    assert_eq!(err.to_string(), "shipped orders need an address");
    assert_eq!(order.state("status").as_deref(), Some("processing"));
    assert!(order.timestamp("dispatchedAt").is_none());
    assert_eq!(log.names().last().map(String::as_str), Some("order.ship.failed"));

    order.set_attribute("address", "1 Main St");
    store.insert(&order);
    machine.invoke(&mut order, "ship").unwrap();
    assert_eq!(
        store.get("o1").unwrap().state("status").as_deref(),
        Some("shipped")
    );
}

#[test]
fn unknown_transition_publishes_nothing() {
    let (machine, log) = order_machine();
    let mut order = pending_order("o1");

    let err = machine.invoke(&mut order, "teleport").unwrap_err();

    assert!(matches!(
        err,
        InvokeError::Configuration(ConfigurationError::UnknownTransition { ref name, .. }) if name == "teleport"
    ));
    assert!(log.is_empty());
}

#[test]
fn event_bus_subscriptions() {
    let bus = Arc::new(EventBus::new());
    let log = Arc::new(EventLog::new());
    let machine = Machine::new(order_registry(), MemoryStore::new())
        .with_sink(FanOut::new(vec![bus.clone() as Arc<dyn EventSink>, log.clone()]));

    let everything = Arc::new(AtomicUsize::new(0));
    let invalid = Arc::new(AtomicUsize::new(0));
    let counter = everything.clone();
    bus.subscribe("order.**", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = invalid.clone();
    let id = bus.subscribe("order.*.invalid", move |name, event| {
        assert!(name.ends_with(".invalid"));
        assert_eq!(event.outcome, Outcome::Invalid);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut order = pending_order("o1");
    machine.invoke(&mut order, "process").unwrap();
    let _ = machine.invoke(&mut order, "process");

    assert_eq!(everything.load(Ordering::SeqCst), 2);
    assert_eq!(invalid.load(Ordering::SeqCst), 1);

    assert!(bus.unsubscribe(id));
    let _ = machine.invoke(&mut order, "process");
    assert_eq!(invalid.load(Ordering::SeqCst), 1);
    assert_eq!(log.len(), 3);
}

#[test]
fn concurrent_invocations_on_separate_entities() {
    let (machine, log) = order_machine();

    std::thread::scope(|scope| {
        for n in 0..8 {
            let machine = &machine;
            scope.spawn(move || {
                let mut order = pending_order(&format!("o{}", n));
                machine.invoke(&mut order, "process").unwrap();
                machine.invoke(&mut order, "complete").unwrap();
                assert_eq!(order.state("status").as_deref(), Some("completed"));
            });
        }
    });

    assert_eq!(log.count(Outcome::Success), 16);
    for n in 0..8 {
        assert_eq!(log.for_entity(&format!("o{}", n)).len(), 2);
    }
}

state_enum! {
    enum TicketState {
        Open => "open",
        InProgress => "in_progress",
        Closed => "closed",
    }
}

#[derive(Clone)]
struct Ticket {
    id: u32,
    state: TicketState,
    closed_at: Option<DateTime<Utc>>,
}

impl Entity for Ticket {
    fn id(&self) -> String {
        format!("ticket-{}", self.id)
    }

    fn state(&self, field: &str) -> Option<String> {
        (field == "state").then(|| self.state.name().to_string())
    }

    fn set_state(&mut self, field: &str, value: &str) -> Result<(), BoxError> {
        if field != "state" {
            return Err(format!("no field '{}'", field).into());
        }
        self.state = TicketState::parse(value).ok_or_else(|| format!("bad state '{}'", value))?;
        Ok(())
    }

    fn set_timestamp(&mut self, field: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        match field {
            "closed_at" => {
                self.closed_at = Some(at);
                Ok(())
            }
            other => Err(format!("no timestamp '{}'", other).into()),
        }
    }
}

impl Patch for Ticket {
    fn patch(&self, since: &Self, onto: &mut Self) {
        if self.state != since.state {
            onto.state = self.state;
        }
        if self.closed_at != since.closed_at {
            onto.closed_at = self.closed_at;
        }
    }
}

#[test]
fn typed_entity_with_state_enum() {
    let registry = Registry::builder("ticket")
        .state_field::<TicketState>("state")
        .unwrap()
        .default_field("state")
        .unwrap()
        .transition(
            TransitionBuilder::new("start")
                .from_states([TicketState::Open])
                .to_state(TicketState::InProgress),
        )
        .unwrap()
        .transition(
            TransitionBuilder::new("close")
                .from_states([TicketState::Open, TicketState::InProgress])
                .to_state(TicketState::Closed)
                .timestamp(),
        )
        .unwrap()
        .build();
    let log = Arc::new(EventLog::new());
    let machine = Machine::new(registry, MemoryStore::new()).with_sink(log.clone());
    let mut ticket = Ticket {
        id: 7,
        state: TicketState::Open,
        closed_at: None,
    };

    let start = machine.trigger("start").unwrap();
    start.invoke(&mut ticket).unwrap();
    assert_eq!(ticket.state, TicketState::InProgress);
    assert!(!start.can_invoke(&ticket).unwrap());

    machine.invoke(&mut ticket, "close").unwrap();
    assert_eq!(ticket.state, TicketState::Closed);
    assert!(ticket.closed_at.is_some());
    assert_eq!(log.names(), vec!["ticket.start.success", "ticket.close.success"]);
}

#[derive(Clone, Default)]
struct Shipment {
    id: String,
    states: HashMap<String, String>,
    stamps: HashMap<String, DateTime<Utc>>,
    in_stock: bool,
    notified: u32,
}

impl Entity for Shipment {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn state(&self, field: &str) -> Option<String> {
        self.states.get(field).cloned()
    }

    fn set_state(&mut self, field: &str, value: &str) -> Result<(), BoxError> {
        self.states.insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn set_timestamp(&mut self, field: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        self.stamps.insert(field.to_string(), at);
        Ok(())
    }

    fn predicate(&self, name: &str) -> Result<bool, BoxError> {
        match name {
            "in_stock" => Ok(self.in_stock),
            other => Err(UnknownCapability::Predicate(other.to_string()).into()),
        }
    }

    fn routine(&mut self, name: &str) -> Result<(), BoxError> {
        match name {
            "notify_courier" => {
                self.notified += 1;
                Ok(())
            }
            other => Err(UnknownCapability::Routine(other.to_string()).into()),
        }
    }
}

impl Patch for Shipment {
    fn patch(&self, since: &Self, onto: &mut Self) {
        for (field, value) in &self.states {
            if since.states.get(field) != Some(value) {
                onto.states.insert(field.clone(), value.clone());
            }
        }
        for (field, at) in &self.stamps {
            if since.stamps.get(field) != Some(at) {
                onto.stamps.insert(field.clone(), *at);
            }
        }
        if self.in_stock != since.in_stock {
            onto.in_stock = self.in_stock;
        }
        if self.notified != since.notified {
            onto.notified = self.notified;
        }
    }
}

#[test]
fn config_driven_machine_with_named_capabilities() {
    let yaml = r#"
entity_type: shipment
default_field: status
fields:
  - name: status
    values: [pending, packed, dispatched]
transitions:
  - name: pack
    from: [pending]
    to: packed
    guard: in_stock
  - name: dispatch
    from: [packed]
    to: dispatched
    timestamp: dispatchedAt
    effect: notify_courier
"#;
    let registry = MachineConfig::from_yaml(yaml)
        .unwrap()
        .into_registry::<Shipment>()
        .unwrap();
    let log = Arc::new(EventLog::new());
    let machine = Machine::new(registry, MemoryStore::new()).with_sink(log.clone());

    let mut shipment = Shipment {
        id: "s1".into(),
        ..Default::default()
    };
    shipment.set_state("status", "pending").unwrap();

    assert!(machine.invoke(&mut shipment, "pack").unwrap_err().is_rejected());

    shipment.in_stock = true;
    machine.invoke(&mut shipment, "pack").unwrap();
    machine.invoke(&mut shipment, "dispatch").unwrap();

    assert_eq!(shipment.state("status").as_deref(), Some("dispatched"));
    assert_eq!(shipment.notified, 1);
    assert!(shipment.stamps.contains_key("dispatchedAt"));
    assert_eq!(
        log.names(),
        vec![
            "shipment.pack.invalid",
            "shipment.pack.success",
            "shipment.dispatch.success",
        ]
    );
}
