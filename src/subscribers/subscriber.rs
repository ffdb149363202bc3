//! # Subscriber extension point.
//!
//! A [`Subscribe`] implementation observes the service's lifecycle [`Event`]s
//! (listener attach/detach, fan-out scheduling, callback failures) without being
//! able to slow the service down. The [`SubscriberSet`](crate::SubscriberSet) gives
//! every subscriber its own worker task fed by a bounded queue; a full queue drops
//! the event for that subscriber alone, and a panic inside `on_event` is reported
//! back on the bus as `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use async_trait::async_trait;
//! use unifier::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::CallbackFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "failure-counter"
//!     }
//!
//!     fn queue_capacity(&self) -> usize {
//!         64
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of lifecycle events.
///
/// `on_event` runs on the subscriber's own worker, one event at a time in
/// publication order. Keep it non-blocking and handle failures inside.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one lifecycle event.
    async fn on_event(&self, event: &Event);

    /// Label reported in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bound of this subscriber's queue; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
