//! # Low-level occurrence payload.
//!
//! An [`Occurrence`] is what an event-capable object hands to its listeners and
//! what callbacks receive on fan-out. Throttled fan-out delivers the **most recent**
//! occurrence seen in the window.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

static OCCURRENCE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One low-level event instance.
#[derive(Clone, Debug)]
pub struct Occurrence {
    /// Process-wide monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp of creation.
    pub at: SystemTime,
    /// Low-level event name (`"scroll"`, `"resize"`, ...).
    pub event_type: Arc<str>,
    /// Optional free-form payload.
    pub detail: Option<Arc<str>>,
}

impl Occurrence {
    /// Creates an occurrence of the given type stamped with the current time.
    pub fn new(event_type: impl Into<Arc<str>>) -> Self {
        Self {
            seq: OCCURRENCE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            event_type: event_type.into(),
            detail: None,
        }
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Arc<str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
