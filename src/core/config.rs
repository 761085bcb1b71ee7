//! # Declarative group and segment configuration.
//!
//! Provides [`SegmentConfig`] and [`GroupConfig`], the bundles a group is
//! created from.
//!
//! Config is used in two ways:
//! 1. **Group creation**: `Registry::create_group(config)` builds every
//!    declared segment atomically.
//! 2. **Runtime addition**: `Registry::add_state(key, segment_config)` adds
//!    one segment to an existing group.
//!
//! ## Field semantics
//! - `state`: the segment's initial committed value.
//! - `actions`: named pure transforms `(current) -> next`; stored on the
//!   segment, never invoked by the engine.
//! - `middlewares`: transform stages applied, in declaration order, to every
//!   committed update. Pending registrations reconciled at group creation
//!   are appended *after* these.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::middleware::MiddlewareFn;
use crate::value::Value;

/// Named pure transform over a segment's value: current in, next out.
pub type ActionFn = Arc<dyn Fn(Value) -> Value + Send + Sync + 'static>;

/// Configuration for a single segment.
///
/// ## Example
/// ```rust
/// use statevisor::{SegmentConfig, Value};
///
/// let counter = SegmentConfig::new(0i64)
///     .with_action("increment", |v: Value| (v.as_int().unwrap_or(0) + 1).into())
///     .with_middleware(|v: Value| (v.as_int().unwrap_or(0).max(0)).into());
///
/// assert_eq!(counter.state().as_int(), Some(0));
/// assert_eq!(counter.middlewares().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct SegmentConfig {
    pub(crate) state: Value,
    pub(crate) actions: IndexMap<String, ActionFn>,
    pub(crate) middlewares: Vec<MiddlewareFn>,
}

impl SegmentConfig {
    /// Creates a segment config with the given initial value.
    pub fn new(state: impl Into<Value>) -> Self {
        Self {
            state: state.into(),
            actions: IndexMap::new(),
            middlewares: Vec::new(),
        }
    }

    /// Adds a named action.
    pub fn with_action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Appends a declared middleware stage.
    pub fn with_middleware(
        mut self,
        stage: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.middlewares.push(Arc::new(stage));
        self
    }

    /// The initial value.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// The named actions, in declaration order.
    pub fn actions(&self) -> &IndexMap<String, ActionFn> {
        &self.actions
    }

    /// The declared middleware stages, in declaration order.
    pub fn middlewares(&self) -> &[MiddlewareFn] {
        &self.middlewares
    }
}

/// Configuration for a whole group: segment key to segment config, in
/// declaration order.
///
/// ## Example
/// ```rust
/// use statevisor::{GroupConfig, SegmentConfig};
///
/// let config = GroupConfig::new()
///     .with_segment("counter", SegmentConfig::new(0i64))
///     .with_segment("profile", SegmentConfig::new("anonymous"));
///
/// assert_eq!(config.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct GroupConfig {
    pub(crate) segments: IndexMap<String, SegmentConfig>,
}

impl GroupConfig {
    /// Creates an empty group config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a segment. A key declared twice keeps the last config.
    pub fn with_segment(mut self, key: impl Into<String>, segment: SegmentConfig) -> Self {
        self.segments.insert(key.into(), segment);
        self
    }

    /// Declared segment keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    /// Number of declared segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if no segments are declared.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
