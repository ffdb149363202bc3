//! # LogWriter: lifecycle event printer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [attached] target="window" type="scroll" channel=1 interval_ms=50
//! [registered] target="window" type="scroll" callback="on-scroll" callbacks=1
//! [scheduled] channel=1 interval_ms=50
//! [delivered] channel=1 callbacks=1
//! [detached] target="window" type="scroll" channel=1
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ListenerAttached => info!(
                "[attached] target={:?} type={:?} channel={:?} interval_ms={:?}",
                e.target, e.event_type, e.channel, e.interval_ms
            ),
            EventKind::ListenerDetached => info!(
                "[detached] target={:?} type={:?} channel={:?}",
                e.target, e.event_type, e.channel
            ),
            EventKind::CallbackRegistered => info!(
                "[registered] target={:?} type={:?} callback={:?} callbacks={:?}",
                e.target, e.event_type, e.callback, e.count
            ),
            EventKind::CallbackUnregistered => info!(
                "[unregistered] target={:?} type={:?} callback={:?} callbacks={:?}",
                e.target, e.event_type, e.callback, e.count
            ),
            EventKind::FanoutScheduled => {
                info!("[scheduled] channel={:?} interval_ms={:?}", e.channel, e.interval_ms)
            }
            EventKind::FanoutDelivered => {
                info!("[delivered] channel={:?} callbacks={:?}", e.channel, e.count)
            }
            EventKind::FanoutCancelled => {
                info!("[cancelled] channel={:?} timers={:?}", e.channel, e.count)
            }
            EventKind::CallbackFailed => info!(
                "[callback-failed] channel={:?} callback={:?} err={:?}",
                e.channel, e.callback, e.reason
            ),
            EventKind::TeardownCompleted => info!("[teardown] records={:?}", e.count),
            EventKind::SubscriberOverflow => info!(
                "[subscriber-overflow] subscriber={:?} reason={:?}",
                e.callback, e.reason
            ),
            EventKind::SubscriberPanicked => info!(
                "[subscriber-panicked] subscriber={} info={}",
                e.callback.as_deref().unwrap_or("unknown"),
                e.reason.as_deref().unwrap_or("unknown"),
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
