//! Ordered transform stages for a segment.

use std::sync::Arc;

use crate::value::{clone_value, Value};

/// A middleware stage: candidate value in, next candidate value out.
pub type MiddlewareFn = Arc<dyn Fn(Value) -> Value + Send + Sync + 'static>;

/// Append-only sequence of middleware stages, applied left to right.
///
/// Each stage's return value passes through the value cloner before feeding
/// the next stage (or being committed, if last), so a stage holding on to
/// its own output can never retroactively alias a value observed elsewhere.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<MiddlewareFn>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_stages(stages: Vec<MiddlewareFn>) -> Self {
        Self { stages }
    }

    /// Appends a stage. There is no removal and no reordering.
    pub fn push(&mut self, stage: MiddlewareFn) {
        self.stages.push(stage);
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Folds `candidate` through the chain in registration order.
    pub fn apply(&self, candidate: Value) -> Value {
        let mut value = candidate;
        for stage in &self.stages {
            value = clone_value(&stage(value));
        }
        value
    }
}
