//! # Resolve one state transition.
//!
//! Turns a [`Candidate`] into a committed, notified value on a segment.
//!
//! - **Unwrap updaters** synchronously against a cloned snapshot of the
//!   current value
//! - **Await deferred candidates** (the engine's only suspension point)
//! - **Commit and notify** once the candidate settles into a plain value
//!
//! ## Resolution flow
//!
//! ```text
//! Updater(f):
//!   prev = clone(current) → candidate = f(prev) → loop     (no suspension)
//!
//! Deferred(fut):
//!   candidate = fut.await → loop                           (suspension point)
//!
//! Plain(v):
//!   final = chain.apply(v) → commit(final) → notify_all(&final) → final
//! ```
//!
//! ## Rules
//! - The updater snapshot is taken when the updater *runs*. If an earlier
//!   link of the same resolution chain suspended on a deferred candidate,
//!   an independently initiated update to the same segment may have
//!   committed in the interim; the snapshot is then stale and the outcome
//!   is last-committer-wins. This is the container's documented ordering
//!   contract, not an accident; there is no locking, versioning, or
//!   compare-and-swap around it.
//! - Commit happens strictly before notification begins.
//! - [`run_sequence`] awaits each element's full settlement (including
//!   nested updater/deferred resolution) before starting the next, so a
//!   script's own elements never overlap.

use crate::core::segment::Segment;
use crate::updates::Candidate;
use crate::value::Value;

/// Resolves `candidate` on `segment`: unwraps updaters and deferred values
/// until a plain value remains, then applies the middleware chain, commits,
/// and notifies subscribers in slot order. Returns the committed value.
pub(crate) async fn resolve(segment: &Segment, candidate: Candidate) -> Value {
    let mut candidate = candidate;
    loop {
        match candidate {
            Candidate::Updater(updater) => {
                let prev = segment.snapshot();
                candidate = updater(prev);
            }
            Candidate::Deferred(deferred) => {
                candidate = deferred.await;
            }
            Candidate::Plain(value) => {
                let committed = segment.chain_snapshot().apply(value);
                segment.commit(committed.clone());
                segment.subscribers().notify_all(&committed);
                return committed;
            }
        }
    }
}

/// Resolves a transition script strictly in order, one element fully
/// settled before the next begins. Intermediate results are discarded
/// except as the eventual committed value.
pub(crate) async fn run_sequence(segment: &Segment, sequence: Vec<Candidate>) {
    for candidate in sequence {
        resolve(segment, candidate).await;
    }
}
