//! # Lifecycle event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! for handling lifecycle events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ```text
//! Registry / Engine ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                 ├──► LogWriter
//!                                                                 ├──► Metrics
//!                                                                 └──► Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
