//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints every committed value to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [update] segment=counter value=1
//! [update] segment=profile value={name: "door", open: true}
//! ```
//!
//! Enabled via the `logging` feature. Not intended for production use;
//! implement a custom [`Subscribe`] for structured logging or metrics
//! collection.

use std::borrow::Cow;

use crate::subscribers::subscribe::Subscribe;
use crate::value::Value;

/// Simple stdout logging subscriber.
pub struct LogWriter {
    label: Cow<'static, str>,
}

impl LogWriter {
    /// Creates a writer tagged with the segment label it is registered on.
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Subscribe for LogWriter {
    fn on_update(&self, value: &Value) {
        println!("[update] segment={} value={}", self.label, value);
    }

    fn name(&self) -> &str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_writer_is_a_subscriber() {
        let writer = LogWriter::new("counter");
        assert_eq!(writer.name(), "log-writer");
        // Rendering goes to stdout; just exercise the path.
        writer.on_update(&Value::from(1i64));
    }
}
