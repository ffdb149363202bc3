//! # unifier
//!
//! **Unifier** multiplexes many logical event subscriptions onto the minimal
//! number of low-level listeners: exactly one per distinct `(target, event type)`
//! pair, no matter how many callbacks subscribe. Each low-level occurrence is
//! fanned out, throttled, to every callback currently registered for the pair.
//!
//! ## Architecture
//! ```text
//!   register("window", "scroll", cb)          unregister(...)            teardown()
//!            │                                       │                        │
//!            ▼                                       ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────────────────────┐
//! │  UnifiedEventService                                                          │
//! │   - Registry: target → event type → HandlerRecord                             │
//! │        record = { element (weak), trigger, channel, interval,                 │
//! │                   callbacks[], pending timers }                               │
//! │   - Engine: throttle + fan-out keyed by ChannelId                             │
//! │   - Bus: lifecycle events ──► SubscriberSet (optional)                        │
//! └───────┬───────────────────────────────────────────────▲───────────────────────┘
//!         │ first register: Resolve::resolve(target)      │ trigger(occ)
//!         │                 element.add_listener(trigger) │
//!         ▼                                               │
//!   ┌───────────────┐    low-level occurrence    ┌────────┴────────┐
//!   │ EventTarget   │ ─────────────────────────► │ trigger(channel)│
//!   │ (Element)     │                            └────────┬────────┘
//!   └───────────────┘                                     ▼
//!                                         interval == 0 → fan-out now
//!                                         interval  > 0 → Scheduler timer,
//!                                                         trailing occurrence
//!                                                         ▼
//!                                             cb1(occ), cb2(occ), ... (snapshot)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Service**       | register / unregister / teardown with refcounted listeners.  | [`UnifiedEventService`], [`ServiceBuilder`] |
//! | **Callbacks**     | Identity-compared fan-out consumers.                         | [`Callback`], [`CallbackFn`], [`CallbackRef`] |
//! | **Targets**       | Event-capable objects and their resolution.                  | [`EventTarget`], [`Element`], [`Resolve`], [`Document`] |
//! | **Scheduling**    | Cancellable delayed execution for throttling.                | [`Scheduler`], [`TokioScheduler`]           |
//! | **Observability** | Lifecycle events and subscribers.                            | [`Event`], [`Subscribe`]                    |
//! | **Errors**        | Typed resolution and callback failures.                      | [`ResolutionError`], [`FanoutError`]        |
//! | **Configuration** | Default interval, bus capacity, headless mode.               | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that renders lifecycle events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use unifier::{CallbackFn, Config, Document, Occurrence, UnifiedEventService};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = Arc::new(Document::new());
//!     let svc = UnifiedEventService::builder(Config::default(), doc.clone()).build()?;
//!
//!     let header = CallbackFn::arc("sticky-header", |occ: &Occurrence| {
//!         println!("header sees {:?}", occ.detail);
//!         Ok(())
//!     });
//!     let lazy = CallbackFn::arc("lazy-images", |occ: &Occurrence| {
//!         println!("images see {:?}", occ.detail);
//!         Ok(())
//!     });
//!     svc.register("window", "scroll", header.clone())?;
//!     svc.register("window", "scroll", lazy.clone())?;
//!     assert_eq!(doc.window().listener_count("scroll"), 1);
//!
//!     // A burst inside one window collapses into one fan-out carrying the last payload.
//!     for y in [10, 20, 30] {
//!         doc.window().dispatch(&Occurrence::new("scroll").with_detail(format!("y={y}")))?;
//!     }
//!     tokio::time::sleep(Duration::from_millis(60)).await;
//!
//!     svc.teardown();
//!     assert_eq!(doc.window().listener_count("scroll"), 0);
//!     Ok(())
//! }
//! ```
mod callbacks;
mod config;
mod core;
mod error;
mod events;
mod scheduler;
mod subscribers;
mod targets;

pub use callbacks::{Callback, CallbackFn, CallbackRef, same_callback};
pub use config::{Config, DEFAULT_INTERVAL};
pub use core::{ChannelId, ServiceBuilder, UnifiedEventService};
pub use error::{CallbackError, FanoutError, ResolutionError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use scheduler::{Scheduler, TimerHandle, TimerTask, TokioScheduler};
pub use subscribers::{Subscribe, SubscriberSet};
pub use targets::{Document, Element, EventTarget, GLOBALS, Listener, Occurrence, Resolve, TargetRef};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
