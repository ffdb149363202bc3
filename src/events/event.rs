//! # Lifecycle events emitted by the unified event service.
//!
//! [`EventKind`] groups into binding changes (listener attach/detach, callback
//! add/remove), dispatch progress (fan-out scheduled, delivered, cancelled, failed)
//! and subscriber health (overflow, panic). [`Event`] carries the kind plus
//! whichever of target, event type, channel, callback name, count, interval and
//! reason apply.
//!
//! `seq` orders events across threads; `at` is for humans.
//!
//! ## Example
//! ```rust
//! use unifier::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CallbackFailed)
//!     .with_binding("window", "scroll")
//!     .with_channel(7)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::CallbackFailed);
//! assert_eq!(ev.target.as_deref(), Some("window"));
//! assert_eq!(ev.channel, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Process-wide counter behind [`Event::seq`].
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Binding events ===
    /// A record was created and its low-level listener attached.
    ///
    /// Sets: `target`, `event_type`, `channel`, `interval_ms`
    ListenerAttached,

    /// A record was destroyed and its low-level listener detached.
    ///
    /// Sets: `target`, `event_type`, `channel`
    ListenerDetached,

    /// A callback was appended to a record.
    ///
    /// Sets: `target`, `event_type`, `channel`, `callback`, `count`
    CallbackRegistered,

    /// One registration of a callback was removed from a record.
    ///
    /// Sets: `target`, `event_type`, `channel`, `callback`, `count`
    CallbackUnregistered,

    // === Dispatch events ===
    /// A throttled fan-out was scheduled.
    ///
    /// Sets: `channel`, `interval_ms`
    FanoutScheduled,

    /// A fan-out pass invoked the record's callbacks.
    ///
    /// Sets: `channel`, `count`
    FanoutDelivered,

    /// Pending fan-out timers were cancelled (unregister or teardown).
    ///
    /// Sets: `channel`, `count` (number of cancelled timers)
    FanoutCancelled,

    /// A callback failed or panicked during a timer-fired fan-out.
    ///
    /// Sets: `channel`, `callback`, `reason`
    CallbackFailed,

    /// Teardown finished; no live records remain.
    ///
    /// Sets: `count` (number of records torn down)
    TeardownCompleted,

    // === Subscriber events ===
    /// A subscriber's `on_event` panicked; the worker keeps running.
    ///
    /// Sets: `callback` (subscriber name), `reason`
    SubscriberPanicked,

    /// An event was not queued for a subscriber (queue full or worker gone).
    ///
    /// Sets: `callback` (subscriber name), `reason`
    SubscriberOverflow,
}

/// One lifecycle notification.
///
/// Only `seq`, `at` and `kind` are always present; each [`EventKind`] documents
/// which of the optional fields it fills in.
#[derive(Clone, Debug)]
pub struct Event {
    /// Strictly increasing across every bus in the process.
    pub seq: u64,
    /// Creation time.
    pub at: SystemTime,
    pub kind: EventKind,

    /// Target identifier, if applicable.
    pub target: Option<Arc<str>>,
    /// Low-level event type, if applicable.
    pub event_type: Option<Arc<str>>,
    /// Fan-out channel of the record involved.
    pub channel: Option<u64>,
    /// Callback (or subscriber) name.
    pub callback: Option<Arc<str>>,
    /// Callbacks, timers or records, depending on the kind.
    pub count: Option<usize>,
    /// Throttle interval in milliseconds (compact).
    pub interval_ms: Option<u32>,
    /// Failure or overflow description.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a fresh `seq` and `at` onto an otherwise empty event.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            target: None,
            event_type: None,
            channel: None,
            callback: None,
            count: None,
            interval_ms: None,
            reason: None,
        }
    }

    /// Attaches the `(target, event type)` pair.
    #[inline]
    pub fn with_binding(mut self, target: impl Into<Arc<str>>, event_type: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self.event_type = Some(event_type.into());
        self
    }

    /// Attaches a fan-out channel id.
    #[inline]
    pub fn with_channel(mut self, channel: u64) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attaches a callback name.
    #[inline]
    pub fn with_callback(mut self, name: impl Into<Arc<str>>) -> Self {
        self.callback = Some(name.into());
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a throttle interval (stored as milliseconds).
    #[inline]
    pub fn with_interval(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.interval_ms = Some(ms);
        self
    }

    /// Attaches a failure description.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Subscriber queue rejected an event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_callback(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Subscriber worker caught a panic.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_callback(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
