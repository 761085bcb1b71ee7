//! # Deferred middleware registrations.
//!
//! Middleware added for a `(group, key)` pair whose group does not exist yet
//! cannot be appended to any chain. It is parked here instead, keyed by
//! group name and segment key, and drained into the segment's chain when the
//! group is finally created.
//!
//! ## Rules
//! - Entries for one `(group, key)` pair keep their arrival order; on
//!   reconciliation they are appended *after* any config-declared stages.
//! - Reconciliation removes the drained entries from the queue.
//! - Entries for keys that are never created persist for the queue's
//!   lifetime (accepted bounded growth for long-lived registries).
//! - A [`Disposer`] removes exactly its own entry, and only while that entry
//!   is still parked. After reconciliation the chain is append-only and the
//!   disposer goes permanently inert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::middleware::chain::MiddlewareFn;

/// One parked registration.
struct PendingEntry {
    id: u64,
    stage: MiddlewareFn,
}

/// Queue of middleware registrations awaiting their group.
pub(crate) struct PendingMiddlewares {
    entries: Mutex<HashMap<String, IndexMap<String, Vec<PendingEntry>>>>,
    next_entry: AtomicU64,
}

impl PendingMiddlewares {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_entry: AtomicU64::new(0),
        }
    }

    /// Parks a stage for a `(group, key)` pair and returns its disposer.
    pub(crate) fn enqueue(
        self: &Arc<Self>,
        group: &str,
        key: &str,
        stage: MiddlewareFn,
    ) -> Disposer {
        let id = self.next_entry.fetch_add(1, AtomicOrdering::Relaxed);

        let mut entries = self.entries.lock();
        entries
            .entry(group.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(Vec::new)
            .push(PendingEntry { id, stage });

        Disposer::pending(Arc::downgrade(self), group, key, id)
    }

    /// Removes and returns all parked stages for `(group, key)`, in arrival
    /// order. Empty when nothing was parked.
    pub(crate) fn take(&self, group: &str, key: &str) -> Vec<MiddlewareFn> {
        let mut entries = self.entries.lock();
        let Some(group_entries) = entries.get_mut(group) else {
            return Vec::new();
        };
        let taken = group_entries
            .shift_remove(key)
            .map(|parked| parked.into_iter().map(|e| e.stage).collect())
            .unwrap_or_default();
        if group_entries.is_empty() {
            entries.remove(group);
        }
        taken
    }

    /// Drops the single entry with the given id, if it is still parked.
    fn remove(&self, group: &str, key: &str, id: u64) {
        let mut entries = self.entries.lock();
        let Some(group_entries) = entries.get_mut(group) else {
            return;
        };
        if let Some(parked) = group_entries.get_mut(key) {
            parked.retain(|e| e.id != id);
            if parked.is_empty() {
                group_entries.shift_remove(key);
            }
        }
        if group_entries.is_empty() {
            entries.remove(group);
        }
    }

    #[cfg(test)]
    pub(crate) fn parked(&self, group: &str, key: &str) -> usize {
        self.entries
            .lock()
            .get(group)
            .and_then(|g| g.get(key))
            .map_or(0, Vec::len)
    }
}

/// Removal capability for a middleware registration.
///
/// Only a registration that was *parked* (its group did not exist yet) is
/// backed by anything removable: disposing it drops the parked entry, once.
/// After the entry has been reconciled into a live chain, and for
/// registrations that targeted a live segment in the first place, the
/// disposer is inert: chains are append-only.
pub struct Disposer {
    inner: Option<PendingDisposer>,
}

struct PendingDisposer {
    queue: Weak<PendingMiddlewares>,
    group: String,
    key: String,
    id: u64,
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("backed", &self.inner.is_some())
            .finish()
    }
}

impl Disposer {
    /// A disposer with nothing to remove.
    pub(crate) fn inert() -> Self {
        Self { inner: None }
    }

    fn pending(queue: Weak<PendingMiddlewares>, group: &str, key: &str, id: u64) -> Self {
        Self {
            inner: Some(PendingDisposer {
                queue,
                group: group.to_string(),
                key: key.to_string(),
                id,
            }),
        }
    }

    /// Removes the backing pending entry, if it is still parked. Idempotent;
    /// a no-op after reconciliation and for live-segment registrations.
    pub fn dispose(&self) {
        if let Some(pending) = &self.inner {
            if let Some(queue) = pending.queue.upgrade() {
                queue.remove(&pending.group, &pending.key, pending.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn stage() -> MiddlewareFn {
        Arc::new(|v: Value| v)
    }

    #[test]
    fn test_take_preserves_arrival_order() {
        let queue = Arc::new(PendingMiddlewares::new());
        let first: MiddlewareFn = Arc::new(|v: Value| (v.as_int().unwrap() + 1).into());
        let second: MiddlewareFn = Arc::new(|v: Value| (v.as_int().unwrap() * 10).into());
        queue.enqueue("default", "counter", first);
        queue.enqueue("default", "counter", second);

        let taken = queue.take("default", "counter");
        assert_eq!(taken.len(), 2);
        // first arrival first: (0 + 1) then (1 * 10)
        let mut v: Value = 0i64.into();
        for stage in &taken {
            v = stage(v);
        }
        assert_eq!(v.as_int(), Some(10));

        // Drained for good.
        assert!(queue.take("default", "counter").is_empty());
    }

    #[test]
    fn test_take_leaves_other_keys_parked() {
        let queue = Arc::new(PendingMiddlewares::new());
        queue.enqueue("default", "created", stage());
        queue.enqueue("default", "never-created", stage());

        queue.take("default", "created");
        assert_eq!(queue.parked("default", "created"), 0);
        assert_eq!(queue.parked("default", "never-created"), 1);
    }

    #[test]
    fn test_disposer_removes_only_its_entry() {
        let queue = Arc::new(PendingMiddlewares::new());
        let first = queue.enqueue("default", "counter", stage());
        let _second = queue.enqueue("default", "counter", stage());

        first.dispose();
        assert_eq!(queue.parked("default", "counter"), 1);

        // Disposing twice changes nothing.
        first.dispose();
        assert_eq!(queue.parked("default", "counter"), 1);
    }

    #[test]
    fn test_disposer_inert_after_reconciliation() {
        let queue = Arc::new(PendingMiddlewares::new());
        let disposer = queue.enqueue("default", "counter", stage());

        let taken = queue.take("default", "counter");
        assert_eq!(taken.len(), 1);

        disposer.dispose();
        assert_eq!(queue.parked("default", "counter"), 0);
    }
}
