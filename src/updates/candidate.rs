//! # Candidate values for a state transition.
//!
//! The engine never probes a candidate's runtime type. A transition input is
//! one of three explicit variants:
//!
//! - [`Candidate::Plain`]: a settled value, ready for the middleware chain.
//! - [`Candidate::Updater`]: a function of the previous state. It receives a
//!   cloned snapshot of the current value and runs synchronously.
//! - [`Candidate::Deferred`]: a value still being computed. Awaiting it is
//!   the engine's only suspension point.
//!
//! Updaters and deferred computations resolve to a *new* candidate, so they
//! can be nested: a deferred computation may settle into an updater, which
//! may in turn return a plain value.
//!
//! ## Example
//! ```rust
//! use statevisor::{Candidate, Value};
//!
//! // A plain value.
//! let plain = Candidate::plain(5i64);
//!
//! // An updater over the previous state.
//! let bump = Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1);
//!
//! // A deferred computation that settles into an updater.
//! let later = Candidate::deferred(async {
//!     Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) * 2)
//! });
//! # let _ = (plain, bump, later);
//! ```

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;

use crate::value::Value;

/// Updater function: previous-state snapshot in, next candidate out.
pub type UpdaterFn = Box<dyn FnOnce(Value) -> Candidate + Send + 'static>;

/// A candidate still being computed asynchronously.
pub type DeferredValue = BoxFuture<'static, Candidate>;

/// Input of a single state resolution.
pub enum Candidate {
    /// A settled value.
    Plain(Value),
    /// A synchronous function of the previous state.
    Updater(UpdaterFn),
    /// An asynchronously resolved candidate.
    Deferred(DeferredValue),
}

impl Candidate {
    /// Wraps a settled value.
    pub fn plain(value: impl Into<Value>) -> Self {
        Candidate::Plain(value.into())
    }

    /// Wraps an updater function.
    ///
    /// The updater receives a cloned snapshot of the segment's current value
    /// and may return anything convertible into a candidate, including
    /// another updater or a deferred computation.
    pub fn updater<F, C>(f: F) -> Self
    where
        F: FnOnce(Value) -> C + Send + 'static,
        C: Into<Candidate>,
    {
        Candidate::Updater(Box::new(move |prev| f(prev).into()))
    }

    /// Wraps an asynchronously resolved candidate.
    pub fn deferred<Fut, C>(fut: Fut) -> Self
    where
        Fut: Future<Output = C> + Send + 'static,
        C: Into<Candidate>,
    {
        Candidate::Deferred(Box::pin(async move { fut.await.into() }))
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Candidate::Updater(_) => f.write_str("Updater(..)"),
            Candidate::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for Candidate {
    fn from(value: Value) -> Self {
        Candidate::Plain(value)
    }
}

impl From<bool> for Candidate {
    fn from(b: bool) -> Self {
        Candidate::Plain(b.into())
    }
}

impl From<i64> for Candidate {
    fn from(n: i64) -> Self {
        Candidate::Plain(n.into())
    }
}

impl From<i32> for Candidate {
    fn from(n: i32) -> Self {
        Candidate::Plain(n.into())
    }
}

impl From<f64> for Candidate {
    fn from(x: f64) -> Self {
        Candidate::Plain(x.into())
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Candidate::Plain(s.into())
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Candidate::Plain(s.into())
    }
}

/// Envelope accepted by `set_state`.
///
/// A sequence is a *transition script*: its elements resolve strictly in
/// order, each fully settled (including nested updater/deferred resolution)
/// before the next begins. A sequence *value* is not a script; commit one
/// with `Update::One(Candidate::Plain(Value::seq(..)))`.
pub enum Update {
    /// A single transition.
    One(Candidate),
    /// An ordered transition script.
    Sequence(Vec<Candidate>),
}

impl Update {
    /// Wraps a single transition.
    pub fn one(candidate: impl Into<Candidate>) -> Self {
        Update::One(candidate.into())
    }

    /// Wraps an ordered transition script.
    pub fn sequence<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        Update::Sequence(candidates.into_iter().collect())
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::One(candidate) => f.debug_tuple("One").field(candidate).finish(),
            Update::Sequence(candidates) => {
                write!(f, "Sequence(len={})", candidates.len())
            }
        }
    }
}

impl From<Candidate> for Update {
    fn from(candidate: Candidate) -> Self {
        Update::One(candidate)
    }
}

impl From<Vec<Candidate>> for Update {
    fn from(candidates: Vec<Candidate>) -> Self {
        Update::Sequence(candidates)
    }
}

impl From<Value> for Update {
    fn from(value: Value) -> Self {
        Update::One(value.into())
    }
}

impl From<bool> for Update {
    fn from(b: bool) -> Self {
        Update::One(b.into())
    }
}

impl From<i64> for Update {
    fn from(n: i64) -> Self {
        Update::One(n.into())
    }
}

impl From<i32> for Update {
    fn from(n: i32) -> Self {
        Update::One(n.into())
    }
}

impl From<f64> for Update {
    fn from(x: f64) -> Self {
        Update::One(x.into())
    }
}

impl From<&str> for Update {
    fn from(s: &str) -> Self {
        Update::One(s.into())
    }
}

impl From<String> for Update {
    fn from(s: String) -> Self {
        Update::One(s.into())
    }
}
