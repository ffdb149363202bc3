//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle changes of the unified event service.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `UnifiedEventService` (attach/detach, register/unregister,
//!   teardown), the dispatch `Engine` (fan-out scheduled/delivered, callback
//!   failures), `SubscriberSet` workers (overflow, panics).
//! - **Consumers**: `UnifiedEventService::subscribe()` receivers and the
//!   subscriber listener feeding `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
