//! The unit of state: one keyed value with its chain and subscribers.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::core::config::{ActionFn, SegmentConfig};
use crate::middleware::{MiddlewareChain, MiddlewareFn};
use crate::subscribers::SubscriberTable;
use crate::value::{clone_value, Value};

/// A single named, independently updatable unit of state.
///
/// The committed value is only ever replaced through [`Segment::commit`],
/// and only with a value that passed fully through the middleware chain; a
/// partially-transformed value is never observable.
pub(crate) struct Segment {
    key: String,
    state: RwLock<Value>,
    actions: IndexMap<String, ActionFn>,
    middlewares: RwLock<MiddlewareChain>,
    subscribers: Arc<SubscriberTable>,
}

impl Segment {
    pub(crate) fn new(key: String, config: SegmentConfig) -> Self {
        Self {
            key,
            state: RwLock::new(config.state),
            actions: config.actions,
            middlewares: RwLock::new(MiddlewareChain::from_stages(config.middlewares)),
            subscribers: SubscriberTable::new(),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// A cloned snapshot of the committed value.
    pub(crate) fn snapshot(&self) -> Value {
        clone_value(&self.state.read())
    }

    /// Replaces the committed value. Callers must have run the candidate
    /// through the middleware chain first.
    pub(crate) fn commit(&self, value: Value) {
        *self.state.write() = value;
    }

    /// A snapshot of the chain, stable for one application round even if a
    /// stage appends more middleware while it runs.
    pub(crate) fn chain_snapshot(&self) -> MiddlewareChain {
        self.middlewares.read().clone()
    }

    pub(crate) fn push_middleware(&self, stage: MiddlewareFn) {
        self.middlewares.write().push(stage);
    }

    pub(crate) fn actions(&self) -> &IndexMap<String, ActionFn> {
        &self.actions
    }

    pub(crate) fn subscribers(&self) -> &Arc<SubscriberTable> {
        &self.subscribers
    }
}
