//! # Demo: counter
//!
//! Demonstrates the basic segment lifecycle.
//!
//! Shows how to:
//! - Declare a group with [`GroupConfig`] / [`SegmentConfig`].
//! - Bind a [`StateHandle`] with `use_segment`.
//! - Apply plain, updater, and deferred updates, plus a transition script.
//! - Observe commits through a registered subscriber.
//!
//! ## Flow
//! ```text
//! Registry::create_group({ counter: 0 })
//!     └─► use_segment("counter")
//!           ├─► register(printer)
//!           ├─► set_state(updater)             counter = 1
//!           ├─► set_state(deferred)            counter = 10
//!           └─► set_state([20, updater])       counter = 20, then 21
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example counter
//! ```

use std::time::Duration;

use statevisor::{Candidate, GroupConfig, Registry, SegmentConfig, SubscribeFn, Update, Value};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), statevisor::StateError> {
    let registry = Registry::new();
    registry.create_group(GroupConfig::new().with_segment(
        "counter",
        SegmentConfig::new(0i64).with_action("reset", |_: Value| 0i64.into()),
    ));

    let counter = registry.use_segment("counter")?;
    println!("initial: {}", counter.initial_state());

    let printer = counter.register(SubscribeFn::arc("printer", |value: &Value| {
        println!("committed: {value}");
    }));

    // A function of the previous state.
    counter
        .set_state(Candidate::updater(|prev: Value| {
            prev.as_int().unwrap_or(0) + 1
        }))
        .await;

    // A value that settles asynchronously.
    counter
        .set_state(Candidate::deferred(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            10i64
        }))
        .await;

    // A transition script: each element fully settled before the next.
    counter
        .set_state(Update::sequence([
            Candidate::plain(20i64),
            Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1),
        ]))
        .await;

    println!("final: {}", counter.get_state());

    // The stored action is a plain function for the caller to apply.
    if let Some(reset) = counter.action("reset") {
        counter.set_state(reset(counter.get_state())).await;
        println!("after reset: {}", counter.get_state());
    }

    printer.unregister();
    Ok(())
}
