//! # statevisor
//!
//! **Statevisor** is a keyed, observable state container for Rust.
//!
//! Callers define named state **segments** grouped under named **groups**;
//! each segment holds a current value, an ordered chain of transform
//! **middlewares**, and a set of subscriber callbacks notified on every
//! committed change. The crate is designed as a building block for
//! application state layers and embedded scripting surfaces.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ StateHandle  │   │ StateHandle  │   │ StateHandle  │
//!     │ (use "a")    │   │ (use "b")    │   │ (use "c")    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (process-wide, explicitly constructed)                  │
//! │  - groups: name → Group                                           │
//! │  - PendingMiddlewares (parked until the target group exists)      │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Group (shared subscriber-slot counter)                           │
//! │   Segment "a"      Segment "b"      Segment "c"                   │
//! │   ├─ value         ├─ value         ├─ value                      │
//! │   ├─ actions       ├─ actions       ├─ actions                    │
//! │   ├─ middlewares   ├─ middlewares   ├─ middlewares                │
//! │   └─ subscribers   └─ subscribers   └─ subscribers                │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!              update engine: resolve(candidate)
//!
//!   Updater(f)    ── prev = clone(current); f(prev) ──► next candidate
//!   Deferred(fut) ── fut.await (suspension point)   ──► next candidate
//!   Plain(v)      ── middleware chain ──► commit ──► notify (slot order)
//! ```
//!
//! ### Update lifecycle
//! ```text
//! set_state(key, update)
//!
//! Update::One(candidate)      ─► resolve(candidate)
//! Update::Sequence([a, b, c]) ─► resolve(a) → resolve(b) → resolve(c)
//!                                (each fully settled before the next)
//!
//! resolve:
//!   loop {
//!     Updater(f)    → candidate = f(clone(current))   // synchronous
//!     Deferred(fut) → candidate = fut.await           // suspends
//!     Plain(v)      → final = chain.apply(v)
//!                     commit(final)                   // before notify
//!                     notify_all(&final)              // ascending slots
//!                     return final
//!   }
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------------|------------------------------------------|
//! | **Values**        | Dynamic state values with shallow structural cloning.              | [`Value`], [`clone_value`]               |
//! | **Updates**       | Plain, updater, and deferred candidates; transition scripts.       | [`Candidate`], [`Update`]                |
//! | **Middleware**    | Append-only transform chains, pre-creation registration.           | [`MiddlewareChain`], [`Disposer`]        |
//! | **Subscribers**   | Slot-ordered callbacks with unregister/restore identity.           | [`Subscribe`], [`SubscriberHandle`]      |
//! | **Groups**        | Named segment collections, declarative configs.                    | [`Group`], [`GroupConfig`]               |
//! | **Registry**      | Explicit process registry, pending-middleware reconciliation.      | [`Registry`]                             |
//! | **Errors**        | Typed errors for registration and addressing failures.             | [`StateError`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber
//!   _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use statevisor::{Candidate, GroupConfig, Registry, SegmentConfig, SubscribeFn, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), statevisor::StateError> {
//!     let registry = Registry::new();
//!
//!     // Middleware may arrive before its group exists; it is reconciled
//!     // into the chain at creation time.
//!     registry.add_middleware("counter", |v: Value| {
//!         (v.as_int().unwrap_or(0).clamp(0, 100)).into()
//!     })?;
//!
//!     registry.create_group(
//!         GroupConfig::new().with_segment("counter", SegmentConfig::new(0i64)),
//!     );
//!
//!     let counter = registry.use_segment("counter")?;
//!     let printer = counter.register(SubscribeFn::arc("printer", |value: &Value| {
//!         println!("counter is now {value}");
//!     }));
//!
//!     counter
//!         .set_state(Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1))
//!         .await;
//!     assert_eq!(counter.get_state().as_int(), Some(1));
//!
//!     printer.unregister();
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod middleware;
mod subscribers;
mod updates;
mod value;

// ---- Public re-exports ----

pub use crate::core::{
    ActionFn, Group, GroupConfig, Registry, SegmentConfig, StateHandle, DEFAULT_GROUP,
};
pub use error::StateError;
pub use middleware::{Disposer, MiddlewareChain, MiddlewareFn};
pub use subscribers::{SlotId, Subscribe, SubscribeFn, SubscriberHandle, SubscriberRef};
pub use updates::{Candidate, DeferredValue, Update, UpdaterFn};
pub use value::{clone_value, Value};

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
