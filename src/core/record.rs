//! # Handler record: state of one low-level binding.
//!
//! One [`HandlerRecord`] exists per live `(target, event type)` pair. It owns the
//! low-level trigger installed on the target, the ordered callback list, and the
//! throttle timers that are scheduled but have not fired yet.
//!
//! ## Rules
//! - `callbacks` is never empty while the record is stored in the registry.
//! - `interval` is fixed at creation (first subscriber wins).
//! - A timer only delivers if its id is still in `pending` when it fires; cancelling
//!   removes the id, so a cancelled timer can never reach the callbacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::debug;

use crate::callbacks::{CallbackRef, same_callback};
use crate::scheduler::TimerHandle;
use crate::targets::{EventTarget, Listener, Occurrence};

/// Fan-out channel identity of a record.
///
/// Allocated from a per-service counter; never reused, so a timer outliving its
/// record cannot deliver into a newer record bound to the same pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub(crate) u64);

impl ChannelId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

pub(crate) struct HandlerRecord {
    pub(crate) target: Arc<str>,
    pub(crate) event_type: Arc<str>,
    /// Non-owning; the resolver owns the target.
    pub(crate) element: Weak<dyn EventTarget>,
    /// Exactly the `Arc` passed to `add_listener`; detach needs the same one.
    pub(crate) trigger: Listener,
    pub(crate) channel: ChannelId,
    pub(crate) interval: Duration,
    callbacks: Vec<CallbackRef>,
    /// `None` while the timer is being handed to the scheduler.
    pending: HashMap<u64, Option<TimerHandle>>,
    /// Trailing-edge payload for the pending timer.
    latest: Option<Occurrence>,
}

impl HandlerRecord {
    pub(crate) fn new(
        target: Arc<str>,
        event_type: Arc<str>,
        element: Weak<dyn EventTarget>,
        trigger: Listener,
        channel: ChannelId,
        interval: Duration,
    ) -> Self {
        Self {
            target,
            event_type,
            element,
            trigger,
            channel,
            interval,
            callbacks: Vec::new(),
            pending: HashMap::new(),
            latest: None,
        }
    }

    /// Appends `cb`; duplicates occupy their own slot.
    pub(crate) fn add_callback(&mut self, cb: CallbackRef) {
        self.callbacks.push(cb);
    }

    /// Removes the first registration of `cb`.
    ///
    /// Returns the number of callbacks left, or `None` when `cb` was not registered.
    pub(crate) fn remove_callback(&mut self, cb: &CallbackRef) -> Option<usize> {
        let pos = self.callbacks.iter().position(|c| same_callback(c, cb))?;
        self.callbacks.remove(pos);
        Some(self.callbacks.len())
    }

    pub(crate) fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Copy of the callback list for a fan-out pass.
    pub(crate) fn snapshot(&self) -> Vec<CallbackRef> {
        self.callbacks.clone()
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.pending.len()
    }

    /// Records the most recent occurrence; returns `true` if a timer is already pending.
    pub(crate) fn stash(&mut self, occurrence: Occurrence) -> bool {
        self.latest = Some(occurrence);
        !self.pending.is_empty()
    }

    /// Reserves `id` before the timer is handed to the scheduler.
    pub(crate) fn reserve_timer(&mut self, id: u64) {
        self.pending.insert(id, None);
    }

    /// Attaches the scheduler handle to a reserved id.
    ///
    /// Returns `false` if the reservation is gone (fired or cancelled meanwhile).
    pub(crate) fn attach_timer(&mut self, id: u64, handle: TimerHandle) -> bool {
        match self.pending.get_mut(&id) {
            Some(slot) => {
                *slot = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Claims the payload for timer `id`; `None` if the timer was cancelled.
    pub(crate) fn complete_timer(&mut self, id: u64) -> Option<Occurrence> {
        self.pending.remove(&id)?;
        self.latest.take()
    }

    /// Removes the trigger from its target, if the target is still alive.
    pub(crate) fn detach(&self) {
        if let Some(element) = self.element.upgrade() {
            element.remove_listener(&self.event_type, &self.trigger);
        }
        debug!(selector = %self.target, event_type = %self.event_type, channel = %self.channel, "low-level listener detached");
    }

    /// Cancels every outstanding throttle timer and drops the stashed payload.
    ///
    /// Returns the number of timers cancelled.
    pub(crate) fn cancel_all_pending_timers(&mut self) -> usize {
        let n = self.pending.len();
        for (_, handle) in self.pending.drain() {
            if let Some(h) = handle {
                h.cancel();
            }
        }
        self.latest = None;
        n
    }
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("target", &self.target)
            .field("event_type", &self.event_type)
            .field("channel", &self.channel)
            .field("interval", &self.interval)
            .field("callbacks", &self.callbacks.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
