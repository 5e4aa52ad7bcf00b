//! In-process publish/subscribe bus shared by the fragments of one page
//!
//! Delivery is synchronous: `publish` returns after every listener that was
//! subscribed at the time of the call has run, in subscription order. The
//! payload is handed to listeners by reference and never serialized.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// A published event as seen by listeners
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    pub name: String,
    pub detail: Value,
}

type Listener = Arc<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<(u64, Listener)>>>,
}

impl Registry {
    fn remove(&self, event_name: &str, id: u64) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(event_name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(event_name);
        }
        removed
    }
}

/// Shared dispatch target; clones publish to the same listeners
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every current subscriber of `event_name`.
    ///
    /// Publishing with no subscribers does nothing. Listeners may subscribe
    /// or unsubscribe from inside a callback; such changes apply to the next
    /// publish.
    pub fn publish(&self, event_name: &str, detail: Option<Value>) {
        let snapshot: Vec<Listener> = {
            let listeners = self
                .registry
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match listeners.get(event_name) {
                Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };

        let event = BusEvent {
            name: event_name.to_string(),
            detail: detail.unwrap_or(Value::Null),
        };
        for listener in snapshot {
            listener(&event);
        }
    }

    /// Register `listener` for every future publish of `event_name`.
    pub fn subscribe<F>(&self, event_name: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let event_name = event_name.into();
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_name.clone())
            .or_default()
            .push((id, Arc::new(listener)));

        Subscription {
            registry: Arc::downgrade(&self.registry),
            event_name,
            id,
        }
    }

    /// Number of listeners currently registered for `event_name`
    #[must_use]
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_name)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Handle to exactly one listener registration
///
/// Dropping the handle keeps the listener registered.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Registry>,
    event_name: String,
    id: u64,
}

impl Subscription {
    /// Remove the listener. Calling this again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event_name, self.id);
        }
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}
