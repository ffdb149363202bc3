//! # Dispatch/throttle engine.
//!
//! Turns low-level occurrences on a record into fan-out passes over the record's
//! callbacks, at most one pass per throttle window.
//!
//! ## Architecture
//! ```text
//! low-level listener (trigger, bound to ChannelId)
//!   └─► Engine::on_occurrence(channel, occ)
//!         ├─ no record for channel  → dropped (record already destroyed)
//!         ├─ interval == 0          → fan_out(snapshot, occ) now, errors returned
//!         └─ interval > 0           → stash occ as latest
//!               ├─ timer pending    → done (trailing edge will carry it)
//!               └─ no timer         → reserve id, scheduler.schedule_after(interval)
//!                                        └─► Engine::fire(channel, id)
//!                                              ├─ id not pending → cancelled, nothing
//!                                              └─ take latest, fan_out(snapshot, latest)
//! ```
//!
//! ## Rules
//! - Fan-out iterates a **snapshot** taken when the pass starts; callbacks may
//!   `register`/`unregister` re-entrantly without disturbing the pass.
//! - The registry lock is never held while callbacks or the scheduler run.
//! - One failing (or panicking) callback never prevents its siblings from running.
//! - Timer-fired failures are published as `CallbackFailed` and logged; synchronous
//!   failures are returned to the caller of the low-level dispatch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::callbacks::CallbackRef;
use crate::core::record::ChannelId;
use crate::core::registry::Registry;
use crate::error::{CallbackError, FanoutError};
use crate::events::{Bus, Event, EventKind};
use crate::scheduler::Scheduler;
use crate::targets::{Listener, Occurrence};

/// Shared state behind a service: the registry plus everything dispatch needs.
pub(crate) struct Engine {
    registry: Mutex<Registry>,
    scheduler: Arc<dyn Scheduler>,
    bus: Bus,
    next_timer: AtomicU64,
}

impl Engine {
    pub(crate) fn new(registry: Registry, scheduler: Arc<dyn Scheduler>, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(registry),
            scheduler,
            bus,
            next_timer: AtomicU64::new(0),
        })
    }

    pub(crate) fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Builds the low-level listener for `channel`.
    ///
    /// Holds the engine weakly: a listener left behind on a target after the
    /// service is gone does nothing.
    pub(crate) fn make_trigger(self: &Arc<Self>, channel: ChannelId) -> Listener {
        let engine = Arc::downgrade(self);
        Arc::new(move |occ: &Occurrence| match engine.upgrade() {
            Some(engine) => engine.on_occurrence(channel, occ.clone()),
            None => Ok(()),
        })
    }

    /// Entry point for one low-level occurrence routed to `channel`.
    pub(crate) fn on_occurrence(
        self: &Arc<Self>,
        channel: ChannelId,
        occ: Occurrence,
    ) -> Result<(), FanoutError> {
        let scheduled = {
            let mut reg = self.registry();
            let Some(record) = reg.by_channel_mut(channel) else {
                trace!(%channel, "occurrence for destroyed record dropped");
                return Ok(());
            };

            if record.interval.is_zero() {
                let callbacks = record.snapshot();
                drop(reg);
                return FanoutError::check(self.fan_out(channel, &callbacks, &occ));
            }

            if record.stash(occ) {
                trace!(%channel, "occurrence coalesced into pending fan-out");
                return Ok(());
            }

            let id = self.next_timer.fetch_add(1, Ordering::Relaxed);
            record.reserve_timer(id);
            self.bus.publish(
                Event::new(EventKind::FanoutScheduled)
                    .with_channel(channel.get())
                    .with_interval(record.interval),
            );
            (id, record.interval)
        };

        let (id, interval) = scheduled;
        let engine = Arc::downgrade(self);
        let handle = self.scheduler.schedule_after(
            interval,
            Box::new(move || {
                if let Some(engine) = engine.upgrade() {
                    engine.fire(channel, id);
                }
            }),
        );

        let mut reg = self.registry();
        let attached = reg
            .by_channel_mut(channel)
            .is_some_and(|record| record.attach_timer(id, handle.clone()));
        if !attached {
            handle.cancel();
        }
        Ok(())
    }

    /// Timer callback: delivers the trailing occurrence unless cancelled meanwhile.
    pub(crate) fn fire(&self, channel: ChannelId, id: u64) {
        let (callbacks, occ) = {
            let mut reg = self.registry();
            let Some(record) = reg.by_channel_mut(channel) else {
                return;
            };
            let Some(occ) = record.complete_timer(id) else {
                return;
            };
            (record.snapshot(), occ)
        };

        for failure in self.fan_out(channel, &callbacks, &occ) {
            warn!(%channel, callback = failure.callback(), error = %failure, "callback failed during fan-out");
            self.bus.publish(
                Event::new(EventKind::CallbackFailed)
                    .with_channel(channel.get())
                    .with_callback(failure.callback())
                    .with_reason(failure.as_message()),
            );
        }
    }

    /// Invokes every callback in `callbacks` with `occ`, collecting failures.
    fn fan_out(&self, channel: ChannelId, callbacks: &[CallbackRef], occ: &Occurrence) -> Vec<CallbackError> {
        trace!(%channel, callbacks = callbacks.len(), seq = occ.seq, "fan-out");
        let mut failures = Vec::new();
        for cb in callbacks {
            match catch_unwind(AssertUnwindSafe(|| cb.call(occ))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(err),
                Err(panic_err) => {
                    let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    };
                    failures.push(CallbackError::Panicked {
                        callback: cb.name().to_string(),
                        info,
                    });
                }
            }
        }

        self.bus.publish(
            Event::new(EventKind::FanoutDelivered)
                .with_channel(channel.get())
                .with_count(callbacks.len()),
        );
        failures
    }
}
