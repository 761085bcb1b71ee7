//! # Demo: log_writer
//!
//! Demonstrates the built-in [`LogWriter`] subscriber.
//!
//! ## Run
//! Requires the `logging` feature:
//! ```bash
//! cargo run --example log_writer --features logging
//! ```

use std::sync::Arc;

use statevisor::{Candidate, GroupConfig, LogWriter, Registry, SegmentConfig, Value};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), statevisor::StateError> {
    let registry = Registry::new();
    registry.create_group(
        GroupConfig::new()
            .with_segment("profile", SegmentConfig::new(Value::map([("name", "anonymous")]))),
    );

    let profile = registry.use_segment("profile")?;
    profile.register(Arc::new(LogWriter::new("profile")));

    profile
        .set_state(Candidate::updater(|prev: Value| {
            let mut entries = prev.as_map().cloned().unwrap_or_default();
            entries.insert("name".to_string(), "door".into());
            Value::from(entries)
        }))
        .await;

    Ok(())
}
