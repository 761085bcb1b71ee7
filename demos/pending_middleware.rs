//! # Demo: pending_middleware
//!
//! Demonstrates middleware registered before its target group exists.
//!
//! Shows how to:
//! - Park middleware for a `(group, key)` pair with `add_middleware`.
//! - Reconcile it at `create_group` time, positioned after config-declared
//!   stages.
//! - Remove a parked registration with its [`Disposer`] before the group is
//!   created.
//!
//! ## Flow
//! ```text
//! add_middleware("price", round)      parked (no group yet)
//! add_middleware("price", audit)      parked, disposed before creation
//! create_group({ price: { middlewares: [clamp] } })
//!     └─► price chain = [clamp, round]
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pending_middleware
//! ```

use statevisor::{GroupConfig, Registry, SegmentConfig, Value};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), statevisor::StateError> {
    let registry = Registry::new();

    // No group exists yet: both registrations are parked.
    let round = registry.add_middleware("price", |v: Value| {
        (v.as_float().map(f64::round).unwrap_or(0.0)).into()
    })?;
    let audit = registry.add_middleware("price", |v: Value| {
        println!("[audit] candidate passed: {v}");
        v
    })?;

    // Changed our mind about auditing before the group was created.
    audit.dispose();

    registry.create_group(GroupConfig::new().with_segment(
        "price",
        SegmentConfig::new(0.0f64)
            // Declared stages run first; parked stages follow in arrival order.
            .with_middleware(|v: Value| (v.as_float().unwrap_or(0.0).clamp(0.0, 1000.0)).into()),
    ));

    let price = registry.use_segment("price")?;
    price.set_state(1234.56f64).await;

    // clamp(1234.56) = 1000.0, then round(1000.0) = 1000
    println!("committed price: {}", price.get_state());

    let _ = round;
    Ok(())
}
