//! # Group: named segments sharing one subscriber-slot counter.
//!
//! A [`Group`] owns its segments and the monotonically increasing slot
//! counter that orders every subscriber registered on any of its segments.
//! It is also the entry point of the update engine: `update_state`,
//! `set_state`, and `dispatch` all resolve candidates against one of its
//! segments.
//!
//! ## Caller surface
//! ```text
//! Registry::use_segment(key)
//!        │
//!        ▼
//!   StateHandle ──► initial_state()   snapshot taken at use() time
//!        │          actions()         cloned action mapping
//!        │          get_state()       fresh clone per call
//!        │          set_state(u)      awaitable resolution
//!        │          dispatch(u)       fire-and-forget resolution
//!        │          register(s)       slot from the group counter
//!        ▼
//!      Group ──► Segment ──► engine::resolve ──► commit ──► notify
//! ```
//!
//! ## Rules
//! - Segment keys are immutable once added; adding a duplicate is an error.
//! - Slot ids are group-wide: registering on any segment consumes the next
//!   id, and ids are never reused or renumbered.
//! - `dispatch` exposes no completion; ordering between independently
//!   dispatched updates to the same key is not guaranteed. Use a sequence
//!   (`Update::Sequence`) when stages must not overlap.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::core::config::{ActionFn, GroupConfig, SegmentConfig};
use crate::core::engine;
use crate::core::segment::Segment;
use crate::error::StateError;
use crate::middleware::MiddlewareFn;
use crate::subscribers::{Subscribe, SubscriberHandle, SubscriberRef};
use crate::updates::{Candidate, Update};
use crate::value::{clone_value, Value};

/// A named collection of segments sharing a subscriber-slot counter.
pub struct Group {
    name: String,
    segments: RwLock<IndexMap<String, Arc<Segment>>>,
    next_slot: AtomicU64,
}

impl Group {
    /// Builds the group and all segments declared in `config`, atomically.
    pub(crate) fn new(name: impl Into<String>, config: GroupConfig) -> Arc<Self> {
        let mut segments = IndexMap::with_capacity(config.segments.len());
        for (key, segment_config) in config.segments {
            let segment = Arc::new(Segment::new(key.clone(), segment_config));
            segments.insert(key, segment);
        }
        Arc::new(Self {
            name: name.into(),
            segments: RwLock::new(segments),
            next_slot: AtomicU64::new(0),
        })
    }

    /// The group's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if `key` is declared in this group.
    pub fn contains(&self, key: &str) -> bool {
        self.segments.read().contains_key(key)
    }

    /// Declared segment keys, in declaration order.
    pub fn keys(&self) -> Vec<String> {
        self.segments.read().keys().cloned().collect()
    }

    fn segment(&self, key: &str) -> Result<Arc<Segment>, StateError> {
        self.segments
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StateError::MissingSegment {
                key: key.to_string(),
            })
    }

    pub(crate) fn allocate_slot(&self) -> u64 {
        self.next_slot.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// Adds a segment to the group.
    ///
    /// Fails with [`StateError::DuplicateSegment`] if `key` already exists;
    /// keys are immutable once added.
    pub fn add_segment(
        &self,
        key: impl Into<String>,
        config: SegmentConfig,
    ) -> Result<(), StateError> {
        let key = key.into();
        let mut segments = self.segments.write();
        if segments.contains_key(&key) {
            return Err(StateError::DuplicateSegment { key });
        }
        let segment = Arc::new(Segment::new(key.clone(), config));
        segments.insert(key, segment);
        Ok(())
    }

    /// Appends a middleware stage to an existing segment's chain.
    pub fn add_middleware(
        &self,
        key: &str,
        stage: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Result<(), StateError> {
        self.push_middleware(key, Arc::new(stage))
    }

    pub(crate) fn push_middleware(&self, key: &str, stage: MiddlewareFn) -> Result<(), StateError> {
        self.segment(key)?.push_middleware(stage);
        Ok(())
    }

    /// Registers a subscriber on `key`, consuming the group's next slot id.
    pub fn register(
        &self,
        key: &str,
        subscriber: SubscriberRef,
    ) -> Result<SubscriberHandle, StateError> {
        let segment = self.segment(key)?;
        let slot = self.allocate_slot();
        Ok(segment.subscribers().register(slot, subscriber))
    }

    /// Registers a weakly-held subscriber on `key`.
    ///
    /// Fails with [`StateError::InvalidCallback`] if the subscriber behind
    /// `weak` was already dropped: a dead callback is not invocable. A live
    /// one is pinned for the lifetime of its registration.
    pub fn register_weak(
        &self,
        key: &str,
        weak: &Weak<dyn Subscribe>,
    ) -> Result<SubscriberHandle, StateError> {
        let live = weak.upgrade().ok_or(StateError::InvalidCallback)?;
        self.register(key, live)
    }

    /// A fresh clone of `key`'s current value.
    pub fn get_state(&self, key: &str) -> Result<Value, StateError> {
        Ok(self.segment(key)?.snapshot())
    }

    /// Resolves one candidate on `key` and returns the committed value.
    pub async fn update_state(
        &self,
        key: &str,
        candidate: impl Into<Candidate>,
    ) -> Result<Value, StateError> {
        let segment = self.segment(key)?;
        Ok(engine::resolve(&segment, candidate.into()).await)
    }

    /// Applies an update on `key`: a single transition, or a transition
    /// script executed strictly in order. Completion is awaitable; the
    /// committed value is observed through subscribers or `get_state`.
    pub async fn set_state(&self, key: &str, update: impl Into<Update>) -> Result<(), StateError> {
        let segment = self.segment(key)?;
        match update.into() {
            Update::One(candidate) => {
                engine::resolve(&segment, candidate).await;
            }
            Update::Sequence(candidates) => {
                engine::run_sequence(&segment, candidates).await;
            }
        }
        Ok(())
    }

    /// Fire-and-forget form of [`Group::set_state`]: spawns the resolution
    /// on the runtime and returns immediately, exposing no completion.
    ///
    /// Must be called within a tokio runtime context.
    pub fn dispatch(&self, key: &str, update: impl Into<Update>) -> Result<(), StateError> {
        let segment = self.segment(key)?;
        let update = update.into();
        tokio::spawn(async move {
            match update {
                Update::One(candidate) => {
                    engine::resolve(&segment, candidate).await;
                }
                Update::Sequence(candidates) => {
                    engine::run_sequence(&segment, candidates).await;
                }
            }
        });
        Ok(())
    }

    /// Binds a caller surface to `key`.
    ///
    /// Fails with [`StateError::MissingSegment`] if `key` was never declared
    /// in the group's configuration.
    pub fn use_segment(self: &Arc<Self>, key: &str) -> Result<StateHandle, StateError> {
        let segment = self.segment(key)?;
        Ok(StateHandle {
            group: Arc::clone(self),
            initial_state: segment.snapshot(),
            actions: segment.actions().clone(),
            segment,
        })
    }
}

/// Caller surface bound to one segment.
///
/// Obtained from [`Group::use_segment`] or
/// [`Registry::use_segment`](crate::Registry::use_segment).
pub struct StateHandle {
    group: Arc<Group>,
    segment: Arc<Segment>,
    initial_state: Value,
    actions: IndexMap<String, ActionFn>,
}

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandle")
            .field("key", &self.segment.key())
            .finish_non_exhaustive()
    }
}

impl StateHandle {
    /// The bound segment key.
    pub fn key(&self) -> &str {
        self.segment.key()
    }

    /// The owning group.
    pub fn group(&self) -> &Arc<Group> {
        &self.group
    }

    /// A clone of the value the segment held when this handle was created.
    pub fn initial_state(&self) -> Value {
        clone_value(&self.initial_state)
    }

    /// The segment's named actions, snapshotted at handle creation.
    pub fn actions(&self) -> &IndexMap<String, ActionFn> {
        &self.actions
    }

    /// Looks up one named action.
    pub fn action(&self, name: &str) -> Option<ActionFn> {
        self.actions.get(name).cloned()
    }

    /// A fresh clone of the current value, taken on every call.
    pub fn get_state(&self) -> Value {
        self.segment.snapshot()
    }

    /// Applies an update on the bound key; completion is awaitable.
    pub async fn set_state(&self, update: impl Into<Update>) {
        match update.into() {
            Update::One(candidate) => {
                engine::resolve(&self.segment, candidate).await;
            }
            Update::Sequence(candidates) => {
                engine::run_sequence(&self.segment, candidates).await;
            }
        }
    }

    /// Fire-and-forget form of [`StateHandle::set_state`].
    ///
    /// Must be called within a tokio runtime context.
    pub fn dispatch(&self, update: impl Into<Update>) {
        let segment = Arc::clone(&self.segment);
        let update = update.into();
        tokio::spawn(async move {
            match update {
                Update::One(candidate) => {
                    engine::resolve(&segment, candidate).await;
                }
                Update::Sequence(candidates) => {
                    engine::run_sequence(&segment, candidates).await;
                }
            }
        });
    }

    /// Registers a subscriber on the bound key, consuming the group's next
    /// slot id.
    pub fn register(&self, subscriber: SubscriberRef) -> SubscriberHandle {
        let slot = self.group.allocate_slot();
        self.segment.subscribers().register(slot, subscriber)
    }

    /// Registers a weakly-held subscriber on the bound key; see
    /// [`Group::register_weak`].
    pub fn register_weak(
        &self,
        weak: &Weak<dyn Subscribe>,
    ) -> Result<SubscriberHandle, StateError> {
        let live = weak.upgrade().ok_or(StateError::InvalidCallback)?;
        Ok(self.register(live))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::SubscribeFn;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn counter_group() -> Arc<Group> {
        Group::new(
            "default",
            GroupConfig::new().with_segment("counter", SegmentConfig::new(0i64)),
        )
    }

    fn collect_commits(group: &Arc<Group>, key: &str) -> Arc<StdMutex<Vec<Value>>> {
        let seen: Arc<StdMutex<Vec<Value>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        group
            .register(
                key,
                SubscribeFn::arc("collector", move |value: &Value| {
                    sink.lock().unwrap().push(value.clone());
                }),
            )
            .unwrap();
        seen
    }

    #[tokio::test]
    async fn test_sequential_updaters_accumulate() {
        let group = counter_group();
        let handle = group.use_segment("counter").unwrap();

        handle
            .set_state(Candidate::updater(|prev: Value| {
                prev.as_int().unwrap_or(0) + 1
            }))
            .await;
        handle
            .set_state(Candidate::updater(|prev: Value| {
                prev.as_int().unwrap_or(0) + 1
            }))
            .await;

        assert_eq!(handle.get_state().as_int(), Some(2));
    }

    #[tokio::test]
    async fn test_update_state_returns_committed_value() {
        let group = counter_group();
        let committed = group.update_state("counter", 41i64).await.unwrap();
        assert_eq!(committed.as_int(), Some(41));
        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(41));
    }

    #[tokio::test]
    async fn test_deferred_candidate_settles_before_commit() {
        let group = counter_group();
        group
            .set_state(
                "counter",
                Candidate::deferred(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    7i64
                }),
            )
            .await
            .unwrap();
        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(7));
    }

    #[tokio::test]
    async fn test_sequence_commits_each_element_in_order() {
        let group = counter_group();
        let seen = collect_commits(&group, "counter");

        group
            .set_state(
                "counter",
                Update::sequence([
                    Candidate::plain(1i64),
                    Candidate::deferred(async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        2i64
                    }),
                    Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1),
                ]),
            )
            .await
            .unwrap();

        let commits: Vec<Option<i64>> = seen.lock().unwrap().iter().map(Value::as_int).collect();
        assert_eq!(commits, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(3));
    }

    #[tokio::test]
    async fn test_middleware_applies_to_every_commit() {
        let group = Group::new(
            "default",
            GroupConfig::new().with_segment(
                "counter",
                SegmentConfig::new(1i64).with_middleware(|v: Value| {
                    (v.as_int().unwrap_or(0) * 10).into()
                }),
            ),
        );
        group.set_state("counter", 5i64).await.unwrap();
        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(50));

        // The initial value is not transformed; only commits are.
        let fresh = Group::new(
            "default",
            GroupConfig::new().with_segment(
                "counter",
                SegmentConfig::new(1i64).with_middleware(|v: Value| {
                    (v.as_int().unwrap_or(0) * 10).into()
                }),
            ),
        );
        assert_eq!(fresh.get_state("counter").unwrap().as_int(), Some(1));
    }

    #[tokio::test]
    async fn test_updater_snapshot_cannot_mutate_state() {
        let group = Group::new(
            "default",
            GroupConfig::new().with_segment("items", SegmentConfig::new(Value::seq([1i64]))),
        );
        let before = group.get_state("items").unwrap();

        group
            .set_state(
                "items",
                Candidate::updater(move |prev: Value| {
                    // The snapshot is the caller's to keep; the committed
                    // value must not share its allocation.
                    prev
                }),
            )
            .await
            .unwrap();

        let after = group.get_state("items").unwrap();
        assert_eq!(before, after);
        assert!(!before.ptr_eq(&after));
    }

    #[tokio::test]
    async fn test_racing_updates_last_committer_wins() {
        let group = counter_group();

        // `slow` suspends on a deferred candidate; `fast` commits while it
        // is parked. The updater then runs against the fresh commit.
        let slow = group.set_state(
            "counter",
            Candidate::deferred(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1)
            }),
        );
        let fast = group.set_state("counter", 100i64);

        let (slow_res, fast_res) = tokio::join!(slow, fast);
        slow_res.unwrap();
        fast_res.unwrap();

        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(101));
    }

    #[tokio::test]
    async fn test_dispatch_resolves_without_awaiting_caller() {
        let group = counter_group();
        let handle = group.use_segment("counter").unwrap();

        handle.dispatch(Update::sequence([
            Candidate::plain(1i64),
            Candidate::updater(|prev: Value| prev.as_int().unwrap_or(0) + 1),
        ]));

        // No completion is exposed; poll the committed value instead.
        for _ in 0..100 {
            if handle.get_state().as_int() == Some(2) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!(
            "dispatched sequence never committed; state = {}",
            handle.get_state()
        );
    }

    #[tokio::test]
    async fn test_use_segment_snapshots_initial_state_and_actions() {
        let group = Group::new(
            "default",
            GroupConfig::new().with_segment(
                "counter",
                SegmentConfig::new(10i64).with_action("double", |v: Value| {
                    (v.as_int().unwrap_or(0) * 2).into()
                }),
            ),
        );
        let handle = group.use_segment("counter").unwrap();

        group.set_state("counter", 99i64).await.unwrap();

        // Captured at use() time, unaffected by later commits.
        assert_eq!(handle.initial_state().as_int(), Some(10));
        assert_eq!(handle.get_state().as_int(), Some(99));

        let double = handle.action("double").unwrap();
        assert_eq!(double(handle.get_state()).as_int(), Some(198));
        assert!(handle.action("missing").is_none());
    }

    #[tokio::test]
    async fn test_use_segment_missing_key_fails() {
        let group = counter_group();
        let err = group.use_segment("undeclared").unwrap_err();
        assert_eq!(
            err,
            StateError::MissingSegment {
                key: "undeclared".into()
            }
        );
    }

    #[tokio::test]
    async fn test_add_segment_rejects_duplicate_key() {
        let group = counter_group();
        let err = group
            .add_segment("counter", SegmentConfig::new(5i64))
            .unwrap_err();
        assert_eq!(err.as_label(), "duplicate_segment");

        // The original segment is untouched.
        assert_eq!(group.get_state("counter").unwrap().as_int(), Some(0));
    }

    #[tokio::test]
    async fn test_slot_counter_is_shared_across_segments() {
        let group = Group::new(
            "default",
            GroupConfig::new()
                .with_segment("a", SegmentConfig::new(0i64))
                .with_segment("b", SegmentConfig::new(0i64)),
        );

        let on_a = group
            .register("a", SubscribeFn::arc("first", |_: &Value| {}))
            .unwrap();
        let on_b = group
            .register("b", SubscribeFn::arc("second", |_: &Value| {}))
            .unwrap();
        let on_a_again = group
            .register("a", SubscribeFn::arc("third", |_: &Value| {}))
            .unwrap();

        assert_eq!(on_a.slot(), 0);
        assert_eq!(on_b.slot(), 1);
        assert_eq!(on_a_again.slot(), 2);
    }

    #[tokio::test]
    async fn test_unregister_restore_keeps_notification_order() {
        let group = counter_group();
        let order: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

        let tag = |name: &'static str| {
            let order = Arc::clone(&order);
            SubscribeFn::arc(name, move |_: &Value| {
                order.lock().unwrap().push(name);
            })
        };

        let early = group.register("counter", tag("early")).unwrap();
        group.register("counter", tag("late")).unwrap();

        early.unregister();
        group.set_state("counter", 1i64).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["late"]);

        order.lock().unwrap().clear();
        early.restore();
        group.set_state("counter", 2i64).await.unwrap();
        // Restored at its original slot, still ahead of "late".
        assert_eq!(*order.lock().unwrap(), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_register_weak_rejects_dropped_subscriber() {
        let group = counter_group();

        let live = SubscribeFn::arc("alive", |_: &Value| {});
        let weak: Weak<dyn Subscribe> = Arc::downgrade(&live) as Weak<dyn Subscribe>;
        drop(live);

        let err = group.register_weak("counter", &weak).unwrap_err();
        assert_eq!(err, StateError::InvalidCallback);
    }

    #[tokio::test]
    async fn test_register_weak_pins_live_subscriber() {
        let group = counter_group();
        let seen = Arc::new(StdMutex::new(0u32));

        let sink = Arc::clone(&seen);
        let live = SubscribeFn::arc("alive", move |_: &Value| {
            *sink.lock().unwrap() += 1;
        });
        let weak: Weak<dyn Subscribe> = Arc::downgrade(&live) as Weak<dyn Subscribe>;

        let handle = group.register_weak("counter", &weak).unwrap();
        drop(live);

        // Registration pinned the subscriber; it still fires.
        group.set_state("counter", 1i64).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
        handle.unregister();
    }

    #[tokio::test]
    async fn test_commit_lands_before_notification() {
        let group = counter_group();
        let observed: Arc<StdMutex<Vec<Option<i64>>>> = Arc::new(StdMutex::new(Vec::new()));

        let group_in_sub = Arc::clone(&group);
        let sink = Arc::clone(&observed);
        group
            .register(
                "counter",
                SubscribeFn::arc("reader", move |_: &Value| {
                    let current = group_in_sub.get_state("counter").unwrap();
                    sink.lock().unwrap().push(current.as_int());
                }),
            )
            .unwrap();

        group.set_state("counter", 5i64).await.unwrap();
        assert_eq!(*observed.lock().unwrap(), vec![Some(5)]);
    }
}
