//! Thread-safe, capacity-capped, append-only Event Store: single
//! writer (the acquisition engine), many concurrent readers.

use std::sync::{Arc, RwLock};

use daq_types::event::Event;

/// Fixed-capacity, append-only store. Cheap to clone (an `Arc` around
/// the lock), so the same handle can be shared with the acquisition
/// thread and any number of reader threads.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    events: Vec<Event>,
    capacity: usize,
    next_event_id: u64,
    was_full: bool,
}

/// Outcome of `add_batch`, used by the engine to decide whether to emit
/// a storage-full notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub appended: usize,
    pub rejected: usize,
    /// True the first time this call observed a size rejection after a
    /// non-full state; fires exactly once per fill transition.
    pub newly_full: bool,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "event store capacity must be at least 1");
        Self {
            inner: Arc::new(RwLock::new(Inner {
                events: Vec::new(),
                capacity,
                next_event_id: 0,
                was_full: false,
            })),
        }
    }

    /// Append one event if there's room. Returns `false` (and fires the
    /// full-transition bookkeeping) if the store is at capacity.
    pub fn add(&self, mut event: Event) -> bool {
        let mut inner = self.inner.write().expect("event store lock poisoned");
        if inner.events.len() >= inner.capacity {
            inner.was_full = true;
            return false;
        }
        event.event_id = inner.next_event_id;
        inner.next_event_id += 1;
        inner.events.push(event);
        inner.was_full = inner.events.len() >= inner.capacity;
        true
    }

    /// Append as many of `events` as fit, in order; the remainder is
    /// rejected. Atomic with respect to other writers (there is only
    /// ever one: the acquisition engine).
    pub fn add_batch(&self, events: Vec<Event>) -> AppendOutcome {
        let mut inner = self.inner.write().expect("event store lock poisoned");
        let was_full_before = inner.was_full;
        let requested = events.len();
        let room = inner.capacity.saturating_sub(inner.events.len());
        let appended = room.min(requested);
        for mut event in events.into_iter().take(appended) {
            event.event_id = inner.next_event_id;
            inner.next_event_id += 1;
            inner.events.push(event);
        }
        inner.was_full = inner.events.len() >= inner.capacity;
        AppendOutcome {
            appended,
            rejected: requested - appended,
            newly_full: inner.was_full && !was_full_before,
        }
    }

    pub fn size(&self) -> usize {
        self.inner.read().expect("event store lock poisoned").events.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().expect("event store lock poisoned").capacity
    }

    pub fn fill_fraction(&self) -> f64 {
        let inner = self.inner.read().expect("event store lock poisoned");
        inner.events.len() as f64 / inner.capacity as f64
    }

    /// Copy out every event matching `predicate`. Callers must not hold
    /// the store lock across their own processing; this always returns
    /// an owned, detached snapshot.
    pub fn snapshot(&self, predicate: impl Fn(&Event) -> bool) -> Vec<Event> {
        let inner = self.inner.read().expect("event store lock poisoned");
        inner.events.iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// Legal only when the engine is Stopped (enforced by the caller,
    /// the acquisition engine's state machine).
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("event store lock poisoned");
        inner.events.clear();
        inner.next_event_id = 0;
        inner.was_full = false;
    }
}
