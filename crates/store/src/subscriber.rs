//! Per-subscriber bounded event queue with drop-oldest-on-full semantics.
//!
//! `tokio::sync::mpsc` drops the *newest* value on a full bounded channel
//! (the sender simply blocks or the `try_send` call fails); the store's
//! broadcast needs the opposite — keep the most recent events, drop the
//! stalest — so subscribers get a small ring buffer instead.

use grove_core::UpdateEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::Store;
use grove_core::Clock;

const DEFAULT_CAPACITY: usize = 64;

struct Inner {
    queue: parking_lot::Mutex<VecDeque<UpdateEvent>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
    closed: AtomicBool,
}

#[derive(Clone)]
pub(crate) struct Subscriber {
    id: u64,
    inner: Arc<Inner>,
}

impl Subscriber {
    pub(crate) fn new(id: u64, capacity: usize) -> (Self, EventReceiver) {
        let inner = Arc::new(Inner {
            queue: parking_lot::Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });
        let subscriber = Self { id, inner: Arc::clone(&inner) };
        let receiver = EventReceiver { inner };
        (subscriber, receiver)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn clone_handle(&self) -> Self {
        self.clone()
    }

    /// Marks the subscription closed and wakes any pending `recv()` so it
    /// observes the close and returns `None` once drained.
    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    /// Never blocks. Pushes the event; if the queue is already at
    /// capacity, drops the oldest queued event first and bumps the
    /// dropped-event counter.
    pub(crate) fn try_send(&self, event: UpdateEvent) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        let mut queue = self.inner.queue.lock();
        if queue.len() >= self.inner.capacity {
            queue.pop_front();
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);
        self.inner.notify.notify_one();
    }
}

/// The receiving half handed to a client of [`Store::subscribe`].
pub struct EventReceiver {
    inner: Arc<Inner>,
}

impl EventReceiver {
    /// Waits for the next event. Returns `None` once the subscription has
    /// been unsubscribed and fully drained.
    pub async fn recv(&mut self) -> Option<UpdateEvent> {
        loop {
            if let Some(event) = self.inner.queue.lock().pop_front() {
                return Some(event);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Non-blocking poll, for tests and for drain loops.
    pub fn try_recv(&mut self) -> Option<UpdateEvent> {
        self.inner.queue.lock().pop_front()
    }

    /// Number of events dropped so far because this subscriber's queue
    /// was full.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

/// Handle returned alongside a subscriber's [`EventReceiver`]; closing it
/// unblocks any pending `recv()` and stops further delivery.
pub struct Unsubscribe<'a, C: Clock = grove_core::SystemClock> {
    id: u64,
    store: &'a Store<C>,
}

impl<'a, C: Clock> Unsubscribe<'a, C> {
    pub(crate) fn new(id: u64, store: &'a Store<C>) -> Self {
        Self { id, store }
    }

    pub fn unsubscribe(self) {
        self.store.remove_subscriber(self.id);
    }
}

pub struct Subscription<'a, C: Clock = grove_core::SystemClock> {
    pub receiver: EventReceiver,
    pub unsubscribe: Unsubscribe<'a, C>,
}

/// An `Arc`-backed subscription for callers (the HTTP stream handler, in
/// particular) that can't hold a borrow of the `Store` for the
/// subscription's whole lifetime. Unsubscribes automatically on drop.
pub struct OwnedSubscription<C: Clock = grove_core::SystemClock> {
    pub receiver: EventReceiver,
    pub(crate) store: Arc<Store<C>>,
    pub(crate) id: u64,
}

impl<C: Clock> Drop for OwnedSubscription<C> {
    fn drop(&mut self) {
        self.store.remove_subscriber(self.id);
    }
}
