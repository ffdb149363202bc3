//! # Lifecycle bus.
//!
//! [`Bus`] fans lifecycle [`Event`]s from the registry, the dispatch engine and the
//! subscriber workers out to any number of receivers over a
//! [`tokio::sync::broadcast`] ring.
//!
//! Receivers that fall behind by more than the ring capacity observe
//! `RecvError::Lagged(n)` and resume at the oldest retained event. An event
//! published while nobody is subscribed is discarded.
//!
//! `publish` is synchronous and runtime-free: the register/unregister API
//! reports from whatever thread it is called on.

use tokio::sync::broadcast;

use super::event::Event;

/// Lifecycle broadcast sender. Clones share one ring.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to current receivers; dropped silently when there are none.
    pub fn publish(&self, ev: Event) {
        if self.tx.send(ev).is_err() {
            tracing::trace!("lifecycle event published with no receivers");
        }
    }

    /// Opens a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
