//! Service core: registry, dispatch and the public facade.
//!
//! The only public API from this module is [`UnifiedEventService`] (plus its
//! [`ServiceBuilder`] and the [`ChannelId`] it hands out in events).
//!
//! Internal modules:
//! - [`record`]: per-`(target, event type)` binding state;
//! - [`registry`]: target → event type → record map, attach/detach;
//! - [`dispatch`]: throttled fan-out engine;
//! - [`service`]: register/unregister/teardown state machine;
//! - [`builder`]: wiring of resolver, scheduler, bus and subscribers.

mod builder;
mod dispatch;
mod record;
mod registry;
mod service;

pub use builder::ServiceBuilder;
pub use record::ChannelId;
pub use service::UnifiedEventService;
