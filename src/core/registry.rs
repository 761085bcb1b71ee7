//! # Registry: group lifecycle and pending-middleware reconciliation.
//!
//! The [`Registry`] is the process-wide front door: it creates groups from
//! declarative configs, adds segments and middleware at runtime, and hands
//! out [`StateHandle`]s. It is an explicit value, not a module-level global;
//! construct one per process, or one per test for isolation.
//!
//! ## Middleware routing
//! ```text
//! add_middleware(key, stage)
//!         │
//!         ├─ group exists ──► Segment chain (append) ──► inert Disposer
//!         │
//!         └─ group missing ─► PendingMiddlewares[(group, key)] ──► wired Disposer
//!
//! create_group(config)
//!         │  for every key declared in config:
//!         └─► chain = config-declared stages ++ pending stages (arrival order)
//!             pending entries for that (group, key) are drained
//! ```
//!
//! ## Rules
//! - Reconciliation happens once, at group creation; pending entries whose
//!   keys never appear in any created config stay parked for the registry's
//!   lifetime (accepted bounded growth).
//! - Re-creating an existing group name replaces the registry entry; prior
//!   handles keep the replaced group alive.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::config::{GroupConfig, SegmentConfig};
use crate::core::group::{Group, StateHandle};
use crate::error::StateError;
use crate::middleware::{Disposer, MiddlewareFn, PendingMiddlewares};
use crate::value::Value;

/// Name used by the single-group convenience methods.
pub const DEFAULT_GROUP: &str = "default";

/// Process-wide registry of named groups.
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
    pending: Arc<PendingMiddlewares>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            pending: Arc::new(PendingMiddlewares::new()),
        }
    }

    /// Creates the default group from `config`.
    ///
    /// See [`Registry::create_group_named`].
    pub fn create_group(&self, config: GroupConfig) -> Arc<Group> {
        self.create_group_named(DEFAULT_GROUP, config)
    }

    /// Creates the named group from `config`, atomically.
    ///
    /// Middleware parked for this group name is reconciled first: for every
    /// key declared in `config`, parked stages are appended after the
    /// config-declared ones, in arrival order, and removed from the queue.
    ///
    /// Re-creating an existing name replaces the registry entry.
    pub fn create_group_named(&self, name: &str, mut config: GroupConfig) -> Arc<Group> {
        let keys: Vec<String> = config.segments.keys().cloned().collect();
        for key in keys {
            let parked = self.pending.take(name, &key);
            if parked.is_empty() {
                continue;
            }
            if let Some(segment) = config.segments.get_mut(&key) {
                segment.middlewares.extend(parked);
            }
        }

        let group = Group::new(name, config);
        self.groups
            .write()
            .insert(name.to_string(), Arc::clone(&group));
        group
    }

    /// Looks up a group by name.
    pub fn group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    fn group_or_err(&self, name: &str) -> Result<Arc<Group>, StateError> {
        self.group(name).ok_or_else(|| StateError::MissingGroup {
            group: name.to_string(),
        })
    }

    /// Adds a segment to the default group.
    pub fn add_state(&self, key: impl Into<String>, config: SegmentConfig) -> Result<(), StateError> {
        self.add_state_in(DEFAULT_GROUP, key, config)
    }

    /// Adds a segment to the named group.
    ///
    /// Fails with [`StateError::DuplicateSegment`] if `key` already exists
    /// and [`StateError::MissingGroup`] if the group was never created.
    pub fn add_state_in(
        &self,
        group: &str,
        key: impl Into<String>,
        config: SegmentConfig,
    ) -> Result<(), StateError> {
        self.group_or_err(group)?.add_segment(key, config)
    }

    /// Adds a middleware stage for `key` in the default group.
    ///
    /// See [`Registry::add_middleware_in`].
    pub fn add_middleware(
        &self,
        key: &str,
        stage: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Result<Disposer, StateError> {
        self.add_middleware_in(DEFAULT_GROUP, key, stage)
    }

    /// Adds a middleware stage for `key` in the named group.
    ///
    /// If the group exists the stage is appended to the segment's chain
    /// directly (failing with [`StateError::MissingSegment`] for an unknown
    /// key) and the returned disposer is inert. If the group does not exist
    /// yet the stage is parked for reconciliation at group creation, and
    /// the disposer removes the parked entry while it remains parked.
    pub fn add_middleware_in(
        &self,
        group: &str,
        key: &str,
        stage: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Result<Disposer, StateError> {
        let stage: MiddlewareFn = Arc::new(stage);
        if let Some(live) = self.group(group) {
            live.push_middleware(key, stage)?;
            return Ok(Disposer::inert());
        }
        Ok(self.pending.enqueue(group, key, stage))
    }

    /// Binds a caller surface to `key` in the default group.
    pub fn use_segment(&self, key: &str) -> Result<StateHandle, StateError> {
        self.use_segment_in(DEFAULT_GROUP, key)
    }

    /// Binds a caller surface to `key` in the named group.
    ///
    /// Fails with [`StateError::MissingGroup`] or
    /// [`StateError::MissingSegment`].
    pub fn use_segment_in(&self, group: &str, key: &str) -> Result<StateHandle, StateError> {
        self.group_or_err(group)?.use_segment(key)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
