//! # Scheduler contract.
//!
//! A [`Scheduler`] runs a task once after a delay and hands back a [`TimerHandle`]
//! that can cancel it. A zero delay runs the task immediately, inline.
//!
//! ## Rules
//! - A cancelled task never runs (cancel wins any race with the deadline).
//! - Cancelling an already-fired or already-cancelled timer is a no-op.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Work executed when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Cancellable handle to a scheduled task.
///
/// Cloning shares the same underlying timer.
#[derive(Clone, Debug, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Creates a fresh, uncancelled handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Cancels the timer; its task will not run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token observed by scheduler implementations.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Time-delayed task execution.
pub trait Scheduler: Send + Sync + 'static {
    /// Runs `task` once after `delay` unless the returned handle is cancelled first.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}
