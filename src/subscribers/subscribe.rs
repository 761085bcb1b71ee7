//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing committed state. A
//! subscriber is invoked synchronously, in slot order, with every value a
//! segment commits.
//!
//! ## Contract
//! - `on_update` runs on the task that committed the update; keep it cheap.
//! - A panicking subscriber is contained: it is reported on stderr and the
//!   rest of the notification round still runs.
//!
//! ## Example
//! ```rust
//! use statevisor::{Subscribe, Value};
//!
//! struct Audit;
//!
//! impl Subscribe for Audit {
//!     fn on_update(&self, value: &Value) {
//!         // write audit record...
//!         let _ = value;
//!     }
//!
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::value::Value;

/// Contract for update subscribers.
pub trait Subscribe: Send + Sync + 'static {
    /// Handle one committed value for this subscriber's segment.
    fn on_update(&self, value: &Value);

    /// Human-readable name (for panic reports and logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a subscriber.
pub type SubscriberRef = Arc<dyn Subscribe>;

/// Function-backed subscriber implementation.
///
/// Wraps a closure so plain functions can be registered without writing a
/// trait impl.
///
/// ## Example
/// ```rust
/// use statevisor::{Subscribe, SubscribeFn, Value};
///
/// let printer = SubscribeFn::arc("printer", |value: &Value| {
///     println!("committed: {value}");
/// });
/// assert_eq!(printer.name(), "printer");
/// ```
pub struct SubscribeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SubscribeFn<F>
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    /// Creates a new function-backed subscriber.
    ///
    /// Prefer [`SubscribeFn::arc`] when you immediately need a
    /// [`SubscriberRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the subscriber and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Subscribe for SubscribeFn<F>
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    fn on_update(&self, value: &Value) {
        (self.f)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
