//! Order Fulfillment
//!
//! This example walks an order through fulfillment with two independent
//! state fields, a guard, an effect that can fail, and an event bus.
//!
//! Key concepts:
//! - Order states (pending -> processing -> shipped -> completed)
//! - A separate payment field that moves on its own
//! - Guards that reject, effects that roll back
//! - Subscribing to events by name pattern
//!
//! Run with: RUST_LOG=debug cargo run --example order_fulfillment

use statefield::core::{BoxError, Domain, Entity, Record};
use statefield::events::{EventBus, FanOut, LoggingSink};
use statefield::{EventSink, Machine, MemoryStore, Registry, TransitionBuilder};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn has_items(order: &Record) -> bool {
    order
        .attribute("items")
        .and_then(|v| v.as_array())
        .map_or(false, |items| !items.is_empty())
}

fn build_registry() -> Result<Registry<Record>, BoxError> {
    let registry = Registry::builder("order")
        .field(
            "status",
            Domain::new(["pending", "processing", "shipped", "completed"]),
        )?
        .field("payment_status", Domain::new(["unpaid", "paid"]))?
        .default_field("status")?
        .transition(
            TransitionBuilder::new("process")
                .from(["pending"])
                .to("processing")
                .timestamp()
                .when(has_items),
        )?
        .transition(
            TransitionBuilder::new("ship")
                .from(["processing"])
                .to("shipped")
                .timestamp_field("dispatchedAt")
                .then(|order: &mut Record| {
                    if order.attribute("address").is_none() {
                        return Err("missing shipping address".into());
                    }
                    let tracking = format!("TRACK-{}", order.id());
                    order.set_attribute("tracking", tracking);
                    Ok(())
                }),
        )?
        .transition(
            TransitionBuilder::new("complete")
                .from(["shipped"])
                .to("completed")
                .timestamp(),
        )?
        .transition(
            TransitionBuilder::new("pay")
                .field("payment_status")
                .from(["unpaid"])
                .to("paid")
                .timestamp(),
        )?
        .build();
    Ok(registry)
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statefield=info")),
        )
        .init();

    println!("=== Order Fulfillment ===\n");

    let bus = Arc::new(EventBus::new());
    bus.subscribe("order.*.failed", |name, event| {
        println!(
            "  [Alert] {} for {}: {}",
            name,
            event.entity_id,
            event.error.as_deref().unwrap_or("unknown")
        );
    });
    bus.subscribe("order.**", |name, _| println!("  [Event] {}", name));

    let machine = Machine::new(build_registry()?, MemoryStore::new()).with_sink(FanOut::new(vec![
        bus.clone() as Arc<dyn EventSink>,
        Arc::new(LoggingSink::new()),
    ]));

    let mut order = Record::new("order-12345")
        .with_state("status", "pending")
        .with_state("payment_status", "unpaid");

    println!("Step 1: Process an empty order");
    if let Err(e) = machine.invoke(&mut order, "process") {
        println!("  Rejected: {}\n", e);
    }

    order.set_attribute("items", serde_json::json!(["Book", "Pen"]));
    println!("Step 2: Process with items");
    machine.invoke(&mut order, "process")?;
    println!();

    println!("Step 3: Pay (independent field)");
    machine.invoke(&mut order, "pay")?;
    println!();

    println!("Step 4: Ship without an address");
    if let Err(e) = machine.invoke(&mut order, "ship") {
        println!("  Failed: {}", e);
        println!("  Status still: {:?}\n", order.state("status"));
    }

    order.set_attribute("address", "123 Main St");
    println!("Step 5: Ship");
    machine.invoke(&mut order, "ship")?;
    println!();

    println!("Step 6: Complete");
    machine.invoke(&mut order, "complete")?;
    println!();

    println!("Final status: {:?}", order.state("status"));
    println!("Payment: {:?}", order.state("payment_status"));
    println!("Allowed now: {:?}", machine.permitted_transitions(&order)?);
    println!("Timestamps:");
    for (field, at) in order.timestamps() {
        println!("  {} = {}", field, at);
    }

    Ok(())
}
