//! # Tokio-backed scheduler.
//!
//! [`TokioScheduler`] spawns one task per timer on a captured runtime handle:
//!
//! ```text
//! schedule_after(delay, task)
//!   └─► spawn ─► select! {
//!                  token.cancelled() ─► exit (task dropped)
//!                  sleep(delay)      ─► task()
//!                }
//! ```
//!
//! The handle is captured at construction, so timers can be scheduled from
//! threads that are not part of the runtime (e.g. a low-level event source thread).

use std::time::Duration;

use tokio::runtime::Handle;

use super::timer::{Scheduler, TimerHandle, TimerTask};

/// Scheduler running timers as tokio tasks.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler spawning onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the runtime the caller is running in.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let timer = TimerHandle::new();
        if delay.is_zero() {
            task();
            return timer;
        }

        let token = timer.token();
        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        });
        timer
    }
}
