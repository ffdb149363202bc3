//! # Event-capable objects.
//!
//! [`EventTarget`] is the primitive the service binds to: it accepts low-level
//! [`Listener`]s per event type and removes them by identity. [`Element`] is the
//! in-process implementation used for globals and selector-addressable targets.
//!
//! ## Rules
//! - `add_listener` does not deduplicate; the service guarantees one listener per record.
//! - `remove_listener` removes the entry whose `Arc` is identical to the given one.
//! - `dispatch` invokes a **snapshot** of the listeners, so listeners may add or
//!   remove listeners on the same element while being invoked.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FanoutError;
use crate::targets::Occurrence;

/// Low-level listener installed on an event-capable object.
pub type Listener = Arc<dyn Fn(&Occurrence) -> Result<(), FanoutError> + Send + Sync>;

/// Shared handle to an event-capable object.
pub type TargetRef = Arc<dyn EventTarget>;

/// Object that low-level listeners can be attached to.
///
/// The service calls `add_listener`/`remove_listener` without holding any of its
/// locks, so an implementation may invoke a listener synchronously while attaching.
pub trait EventTarget: Send + Sync + 'static {
    /// Attaches `listener` for `event_type`.
    fn add_listener(&self, event_type: &str, listener: Listener);

    /// Detaches the listener identical to `listener` for `event_type`; no-op when absent.
    fn remove_listener(&self, event_type: &str, listener: &Listener);
}

/// In-process event target.
pub struct Element {
    name: Cow<'static, str>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl Element {
    /// Creates an element with no listeners.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the element as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    /// Element name (diagnostics only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivers `occurrence` to every listener attached for its event type.
    ///
    /// Failures from all listeners are merged into one [`FanoutError`].
    pub fn dispatch(&self, occurrence: &Occurrence) -> Result<(), FanoutError> {
        let snapshot: Vec<Listener> = {
            let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            map.get(occurrence.event_type.as_ref())
                .cloned()
                .unwrap_or_default()
        };

        let mut failures = Vec::new();
        for listener in snapshot {
            if let Err(err) = listener(occurrence) {
                failures.extend(err.failures);
            }
        }
        FanoutError::check(failures)
    }

    /// Number of listeners attached for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(event_type).map_or(0, Vec::len)
    }

    /// Number of listeners attached across all event types.
    pub fn total_listeners(&self) -> usize {
        let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().map(Vec::len).sum()
    }
}

impl EventTarget for Element {
    fn add_listener(&self, event_type: &str, listener: Listener) {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(event_type.to_string()).or_default().push(listener);
    }

    fn remove_listener(&self, event_type: &str, listener: &Listener) {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = map.get_mut(event_type) {
            if let Some(pos) = list.iter().position(|l| Arc::ptr_eq(l, listener)) {
                list.remove(pos);
            }
            if list.is_empty() {
                map.remove(event_type);
            }
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
