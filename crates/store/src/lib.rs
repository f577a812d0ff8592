//! In-memory aggregate state, published to subscribers on every write.
//!
//! Writes are serialized behind [`Store::apply`]; reads go through an
//! [`arc_swap::ArcSwap`] so a `get()` never contends with a writer building
//! the next snapshot.

mod subscriber;

pub use subscriber::{OwnedSubscription, Subscription, Unsubscribe};

use grove_core::{Clock, Draft, StateSnapshot, SystemClock, UpdateEvent, UpdatePayload, UpdateType};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use subscriber::Subscriber;

/// Whether a mutator's changes to the draft should be published.
pub enum Commit {
    Apply,
    Cancel,
}

pub struct Store<C: Clock = SystemClock> {
    current: arc_swap::ArcSwap<StateSnapshot>,
    write_lock: Mutex<()>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscriber_id: AtomicU64,
    clock: C,
}

impl Store<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Store<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Store<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            current: arc_swap::ArcSwap::from_pointee(StateSnapshot::empty()),
            write_lock: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(0),
            clock,
        }
    }

    /// An immutable view of the current state. Wait-free with respect to
    /// concurrent writers.
    pub fn get(&self) -> Arc<StateSnapshot> {
        self.current.load_full()
    }

    pub fn get_workspaces(&self) -> Arc<Vec<grove_core::Workspace>> {
        Arc::clone(&self.current.load().workspaces)
    }

    pub fn get_sessions(&self) -> Arc<Vec<grove_core::Session>> {
        Arc::clone(&self.current.load().sessions)
    }

    /// Run `mutator` against a draft copy of the current state. If it
    /// returns [`Commit::Apply`], bumps the revision, stamps the write
    /// time, publishes the new snapshot, and broadcasts an [`UpdateEvent`]
    /// carrying the payload appropriate to `update_type`.
    pub fn apply<F>(&self, source: &str, update_type: UpdateType, scanned: Option<u64>, mutator: F)
    where
        F: FnOnce(&mut Draft) -> Commit,
    {
        let _write_guard = self.write_lock.lock();

        let before = self.current.load_full();
        let mut draft = Draft::from_snapshot(&before);
        match mutator(&mut draft) {
            Commit::Cancel => return,
            Commit::Apply => {}
        }

        let revision = before.revision + 1;
        let updated_at = self.clock.epoch_ms();
        let next = Arc::new(draft.into_snapshot(revision, updated_at));
        self.current.store(Arc::clone(&next));

        let payload = payload_for(&update_type, &next);
        let event = UpdateEvent {
            revision,
            updated_at,
            update_type,
            source: source.to_string(),
            scanned,
            payload,
        };
        self.broadcast(event);
    }

    /// Register a new live subscriber. The first event it receives is a
    /// synthesized `initial` event carrying the state at registration time.
    pub fn subscribe(&self) -> Subscription<'_, C> {
        let (id, receiver) = self.register_subscriber();
        Subscription {
            receiver,
            unsubscribe: Unsubscribe::new(id, self),
        }
    }

    /// Same as [`Store::subscribe`], but for callers that can't borrow the
    /// store for the subscription's whole lifetime (an axum streaming
    /// handler, for one). Unsubscribes automatically when dropped.
    pub fn subscribe_owned(self: &Arc<Self>) -> subscriber::OwnedSubscription<C> {
        let (id, receiver) = self.register_subscriber();
        subscriber::OwnedSubscription { receiver, store: Arc::clone(self), id }
    }

    fn register_subscriber(&self) -> (u64, subscriber::EventReceiver) {
        let snapshot = self.current.load_full();
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (subscriber, receiver) = Subscriber::new(id, 64);
        let initial = UpdateEvent::initial(&snapshot);
        // Registration-time send can't fail: the channel was just created
        // with capacity 64 and nobody else holds the sender yet.
        subscriber.try_send(initial);
        self.subscribers.lock().push(subscriber.clone_handle());
        (id, receiver)
    }

    fn broadcast(&self, event: UpdateEvent) {
        // Short critical section: never hold this lock across a send that
        // could block. try_send is non-blocking and drop-oldest on a full
        // queue happens inside Subscriber::try_send, not here.
        let subscribers = self.subscribers.lock();
        for subscriber in subscribers.iter() {
            subscriber.try_send(event.clone());
        }
    }

    fn remove_subscriber(&self, id: u64) {
        let mut subscribers = self.subscribers.lock();
        if let Some(pos) = subscribers.iter().position(|s| s.id() == id) {
            let removed = subscribers.remove(pos);
            removed.close();
        }
    }
}

fn payload_for(update_type: &UpdateType, snapshot: &StateSnapshot) -> UpdatePayload {
    match update_type {
        UpdateType::Initial => UpdatePayload {
            workspaces: Some(Arc::clone(&snapshot.workspaces)),
            sessions: Some(Arc::clone(&snapshot.sessions)),
            focus: Some(Arc::clone(&snapshot.focus)),
        },
        UpdateType::Workspaces => UpdatePayload {
            workspaces: Some(Arc::clone(&snapshot.workspaces)),
            sessions: None,
            focus: None,
        },
        UpdateType::Sessions => UpdatePayload {
            workspaces: None,
            sessions: Some(Arc::clone(&snapshot.sessions)),
            focus: None,
        },
        UpdateType::Focus => UpdatePayload {
            workspaces: None,
            sessions: None,
            focus: Some(Arc::clone(&snapshot.focus)),
        },
        UpdateType::Other(_) => UpdatePayload::default(),
    }
}

// Re-exported so callers constructing WorkspaceId/SessionId-keyed drafts
// don't need a second `use grove_core::...` import.
#[doc(hidden)]
pub mod prelude {
    pub use grove_core::{SessionId, WorkspaceId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::{FakeClock, Workspace, WorkspaceKind};
    use std::path::PathBuf;

    fn workspace(id: &str) -> Workspace {
        Workspace::new(
            WorkspaceId::from_canonical_path(&PathBuf::from(id)),
            PathBuf::from(id),
            id.to_string(),
            WorkspaceKind::Project,
            0,
        )
    }

    #[test]
    fn apply_bumps_revision_and_updates_snapshot() {
        let store = Store::with_clock(FakeClock::new());
        store.apply("workspace", UpdateType::Workspaces, Some(1), |draft| {
            draft.workspaces.push(workspace("/a"));
            Commit::Apply
        });
        let snapshot = store.get();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.workspaces.len(), 1);
    }

    #[test]
    fn cancelled_mutator_does_not_bump_revision() {
        let store = Store::with_clock(FakeClock::new());
        store.apply("workspace", UpdateType::Workspaces, None, |draft| {
            draft.workspaces.push(workspace("/a"));
            Commit::Cancel
        });
        assert_eq!(store.get().revision, 0);
        assert!(store.get().workspaces.is_empty());
    }

    #[test]
    fn revision_strictly_increases_across_applies() {
        let store = Store::with_clock(FakeClock::new());
        let mut last = 0;
        for i in 0..5 {
            store.apply("workspace", UpdateType::Workspaces, None, |draft| {
                draft.workspaces.push(workspace(&format!("/w{i}")));
                Commit::Apply
            });
            let rev = store.get().revision;
            assert!(rev > last);
            last = rev;
        }
    }

    #[tokio::test]
    async fn subscriber_receives_initial_event_first() {
        let store = Store::with_clock(FakeClock::new());
        let mut sub = store.subscribe();
        let first = sub.receiver.recv().await.expect("initial event");
        assert_eq!(first.update_type, UpdateType::Initial);
    }

    #[tokio::test]
    async fn subscriber_sees_revisions_strictly_after_initial() {
        let store = Store::with_clock(FakeClock::new());
        let mut sub = store.subscribe();
        let initial = sub.receiver.recv().await.expect("initial event");

        store.apply("workspace", UpdateType::Workspaces, None, |draft| {
            draft.workspaces.push(workspace("/a"));
            Commit::Apply
        });

        let next = sub.receiver.recv().await.expect("update event");
        assert!(next.revision > initial.revision);
    }

    #[tokio::test]
    async fn unsubscribe_stops_further_delivery() {
        let store = Store::with_clock(FakeClock::new());
        let mut sub = store.subscribe();
        let _ = sub.receiver.recv().await;
        sub.unsubscribe.unsubscribe();

        store.apply("workspace", UpdateType::Workspaces, None, |draft| {
            draft.workspaces.push(workspace("/a"));
            Commit::Apply
        });

        assert!(sub.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_queue_drops_oldest_not_newest() {
        let store = Store::with_clock(FakeClock::new());
        let mut sub = store.subscribe();
        let _ = sub.receiver.recv().await; // drain initial

        for i in 0..100u64 {
            store.apply("workspace", UpdateType::Workspaces, Some(i), |_draft| {
                Commit::Apply
            });
        }

        let mut last_seen = 0;
        while let Some(event) = sub.receiver.try_recv() {
            assert!(event.revision >= last_seen);
            last_seen = event.revision;
        }
        // The most recent write must have been delivered (or still in the
        // queue); it cannot have been the one dropped.
        assert_eq!(last_seen, store.get().revision);
    }
}
