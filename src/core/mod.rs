//! Container core: groups, segments, and the update engine.
//!
//! This module contains the embedded implementation of the statevisor
//! container. The public API from this module is [`Registry`] (the
//! process-wide group registry), [`Group`] and [`StateHandle`] (the
//! per-segment caller surface), and the config value types.
//!
//! Internal modules:
//! - [`config`]: declarative group/segment configuration bundles;
//! - [`segment`]: the unit of state (value, actions, chain, subscribers);
//! - [`engine`]: resolves one candidate into a committed, notified value;
//! - [`group`]: named segment collection with the shared slot counter;
//! - [`registry`]: group lifecycle and pending-middleware reconciliation.

mod config;
mod engine;
mod group;
mod registry;
mod segment;

pub use config::{ActionFn, GroupConfig, SegmentConfig};
pub use group::{Group, StateHandle};
pub use registry::{Registry, DEFAULT_GROUP};
