//! # Slot table: ordered, restorable subscriber storage.
//!
//! One table per segment. Entries are keyed by a slot id allocated from the
//! owning group's shared counter, so notification order across a group is
//! registration order, and a slot is never reused for a different
//! subscriber.
//!
//! ## What it guarantees
//! - `notify_all` walks entries in ascending slot order.
//! - A panic inside one subscriber is caught and reported (isolation); the
//!   remaining subscribers in the round still run.
//! - Removing an absent slot is a no-op.
//!
//! ## What it does **not** guarantee
//! - Registrations or removals performed *inside* a callback take effect
//!   from the next notification round, not the current one (the round runs
//!   over a snapshot, outside the table lock).

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::subscribers::subscribe::SubscriberRef;
use crate::value::Value;

/// Stable identity of a registered subscriber within its group.
pub type SlotId = u64;

/// Per-segment subscriber storage, ordered by slot id.
pub(crate) struct SubscriberTable {
    slots: Mutex<BTreeMap<SlotId, SubscriberRef>>,
}

impl SubscriberTable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(BTreeMap::new()),
        })
    }

    /// Inserts `subscriber` at `slot` and returns the restore/unregister
    /// handle. The slot must come from the owning group's counter.
    pub(crate) fn register(self: &Arc<Self>, slot: SlotId, subscriber: SubscriberRef) -> SubscriberHandle {
        self.slots.lock().insert(slot, Arc::clone(&subscriber));
        SubscriberHandle {
            slot,
            subscriber,
            table: Arc::downgrade(self),
        }
    }

    fn insert(&self, slot: SlotId, subscriber: SubscriberRef) {
        self.slots.lock().insert(slot, subscriber);
    }

    /// Tombstones `slot`. No-op if the slot is already absent.
    fn remove(&self, slot: SlotId) {
        self.slots.lock().remove(&slot);
    }

    /// Invokes every currently-present subscriber in ascending slot order.
    ///
    /// Each invocation is isolated: a panicking subscriber is reported on
    /// stderr and does not stop the round. The table lock is released before
    /// any callback runs.
    pub(crate) fn notify_all(&self, value: &Value) {
        let round: Vec<SubscriberRef> = self.slots.lock().values().map(Arc::clone).collect();
        for subscriber in round {
            let outcome = catch_unwind(AssertUnwindSafe(|| subscriber.on_update(value)));
            if let Err(panic_err) = outcome {
                eprintln!(
                    "[statevisor] subscriber '{}' panicked: {:?}",
                    subscriber.name(),
                    panic_err
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, slot: SlotId) -> bool {
        self.slots.lock().contains_key(&slot)
    }
}

/// Handle returned by registration.
///
/// Exposes `unregister` (tombstone the slot) and `restore` (re-insert the
/// *original* subscriber at the *same* slot id, regardless of how many times
/// it was previously removed). Handles are independently reusable any number
/// of times; dropping one changes nothing.
pub struct SubscriberHandle {
    slot: SlotId,
    subscriber: SubscriberRef,
    table: Weak<SubscriberTable>,
}

impl std::fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl SubscriberHandle {
    /// The slot id this subscriber was registered under. Never renumbered.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Removes the entry at this handle's slot. Idempotent.
    pub fn unregister(&self) {
        if let Some(table) = self.table.upgrade() {
            table.remove(self.slot);
        }
    }

    /// Re-inserts the original subscriber at the original slot id.
    pub fn restore(&self) {
        if let Some(table) = self.table.upgrade() {
            table.insert(self.slot, Arc::clone(&self.subscriber));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::subscribe::SubscribeFn;
    use std::sync::Mutex as StdMutex;

    fn recorder() -> (Arc<StdMutex<Vec<i64>>>, impl Fn(i64) -> SubscriberRef) {
        let seen: Arc<StdMutex<Vec<i64>>> = Arc::new(StdMutex::new(Vec::new()));
        let make = {
            let seen = Arc::clone(&seen);
            move |tag: i64| -> SubscriberRef {
                let seen = Arc::clone(&seen);
                SubscribeFn::arc("recorder", move |_: &Value| {
                    seen.lock().unwrap().push(tag);
                })
            }
        };
        (seen, make)
    }

    #[test]
    fn test_notify_ascending_slot_order() {
        let table = SubscriberTable::new();
        let (seen, make) = recorder();

        // Register out of slot order on purpose.
        table.register(7, make(7));
        table.register(0, make(0));
        table.register(3, make(3));

        table.notify_all(&Value::Unit);
        assert_eq!(*seen.lock().unwrap(), vec![0, 3, 7]);
    }

    #[test]
    fn test_unregister_is_idempotent_and_restore_keeps_slot() {
        let table = SubscriberTable::new();
        let (seen, make) = recorder();

        let first = table.register(0, make(0));
        table.register(1, make(1));

        first.unregister();
        first.unregister(); // no-op
        table.notify_all(&Value::Unit);
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        first.restore();
        table.notify_all(&Value::Unit);
        // Restored subscriber is back at slot 0, ahead of slot 1.
        assert_eq!(*seen.lock().unwrap(), vec![1, 0, 1]);

        // Handles survive any number of cycles.
        first.unregister();
        first.restore();
        assert!(table.contains(0));
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_round() {
        let table = SubscriberTable::new();
        let (seen, make) = recorder();

        table.register(
            0,
            SubscribeFn::arc("bomb", |_: &Value| panic!("subscriber exploded")),
        );
        table.register(1, make(1));

        table.notify_all(&Value::Unit);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
