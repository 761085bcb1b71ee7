//! Update engine input: candidates and transition scripts.
//!
//! [`Candidate`] is the tagged input of a single state resolution; [`Update`]
//! is the envelope accepted by `set_state`, distinguishing a single
//! transition from an ordered transition script.

mod candidate;

pub use candidate::{Candidate, DeferredValue, Update, UpdaterFn};
