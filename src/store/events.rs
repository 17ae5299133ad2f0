//! Listener Registry Module
//!
//! Per-event-kind sets of callbacks with isolated, synchronous fan-out.
//! Callbacks are keyed by `Arc` identity: re-adding the same callback is a
//! no-op and removal matches the same identity, never value equality.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::error;

// == Event Kind ==
/// The three change-event kinds a store emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Update,
    Remove,
}

// == Store Event ==
/// Change-event payloads. Fixed shapes, no versioning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoreEvent {
    /// A value was written under a previously absent key
    Added { key: String, value: Value },
    /// A value was written over a previously live key
    Updated {
        key: String,
        old_value: Value,
        new_value: Value,
    },
    /// A key transitioned from present to absent
    Removed { key: String },
}

impl StoreEvent {
    /// The kind this event is dispatched under.
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::Added { .. } => EventKind::Add,
            StoreEvent::Updated { .. } => EventKind::Update,
            StoreEvent::Removed { .. } => EventKind::Remove,
        }
    }

    /// The key this event concerns.
    pub fn key(&self) -> &str {
        match self {
            StoreEvent::Added { key, .. }
            | StoreEvent::Updated { key, .. }
            | StoreEvent::Removed { key } => key,
        }
    }
}

/// Callback invoked for every event of the kind it was registered under.
pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

// Identity comparison over the callback's data pointer. Two clones of the
// same Arc compare equal; distinct allocations never do.
fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const u8,
        Arc::as_ptr(b) as *const u8,
    )
}

// == Listener Registry ==
/// Mapping from event kind to a set of opaque callback handles.
#[derive(Default)]
pub struct ListenerRegistry {
    sets: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under a kind. Re-adding the same callback
    /// (same `Arc`) is a no-op.
    pub fn add(&self, kind: EventKind, listener: Listener) {
        let mut sets = self.sets.lock().unwrap();
        let set = sets.entry(kind).or_default();
        if !set.iter().any(|l| same_listener(l, &listener)) {
            set.push(listener);
        }
    }

    /// Removes a callback by identity. An absent callback is a no-op.
    pub fn remove(&self, kind: EventKind, listener: &Listener) {
        let mut sets = self.sets.lock().unwrap();
        if let Some(set) = sets.get_mut(&kind) {
            set.retain(|l| !same_listener(l, listener));
        }
    }

    /// Detaches every callback of every kind.
    pub fn clear(&self) {
        self.sets.lock().unwrap().clear();
    }

    /// Number of callbacks registered under a kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.sets
            .lock()
            .unwrap()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Invokes every callback registered for the event's kind, synchronously.
    ///
    /// Every callback observes the same payload snapshot. A panicking
    /// callback is caught and logged; the remaining callbacks still run and
    /// nothing propagates to the triggering caller.
    pub fn emit(&self, event: &StoreEvent) {
        // Snapshot under the lock, invoke outside it
        let snapshot: Vec<Listener> = {
            let sets = self.sets.lock().unwrap();
            sets.get(&event.kind()).cloned().unwrap_or_default()
        };

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                error!(kind = ?event.kind(), key = event.key(), "Listener panicked while handling event");
            }
        }
    }
}
