//! Error types used by the statevisor registry and update engine.
//!
//! All fallible operations in this crate report [`StateError`]. The variants
//! split into two families:
//!
//! - registration failures (`InvalidCallback`) that are returned as values
//!   for the caller to check;
//! - addressing failures (`MissingSegment`, `DuplicateSegment`,
//!   `MissingGroup`) that signal programmer errors in how segments and
//!   groups are declared.
//!
//! The type provides helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use thiserror::Error;

/// # Errors produced by the state registry and update engine.
///
/// Subscriber callback failures during notification are *not* represented
/// here: they are contained per callback (commit happens strictly before
/// notification begins) and never surface as a `StateError`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The registered callback is no longer invocable: the weakly-held
    /// subscriber behind it was dropped before registration.
    #[error("the registered callback must be invocable (subscriber already dropped)")]
    InvalidCallback,

    /// A segment key was used that was never declared in the group's
    /// configuration.
    #[error("missing segment '{key}' in the group config")]
    MissingSegment {
        /// The undeclared segment key.
        key: String,
    },

    /// A segment key was added that already exists in the group.
    #[error("segment key '{key}' already exists, please use a different key")]
    DuplicateSegment {
        /// The conflicting segment key.
        key: String,
    },

    /// An operation targeted a group that was never created.
    #[error("group '{group}' has not been created")]
    MissingGroup {
        /// The unknown group name.
        group: String,
    },
}

impl StateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::StateError;
    ///
    /// let err = StateError::MissingSegment { key: "counter".into() };
    /// assert_eq!(err.as_label(), "missing_segment");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::InvalidCallback => "invalid_callback",
            StateError::MissingSegment { .. } => "missing_segment",
            StateError::DuplicateSegment { .. } => "duplicate_segment",
            StateError::MissingGroup { .. } => "missing_group",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StateError::InvalidCallback => "callback is not invocable".to_string(),
            StateError::MissingSegment { key } => format!("missing segment: {key}"),
            StateError::DuplicateSegment { key } => format!("duplicate segment: {key}"),
            StateError::MissingGroup { group } => format!("missing group: {group}"),
        }
    }
}
