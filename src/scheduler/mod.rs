//! # Delayed execution for throttled fan-out.
//!
//! - [`Scheduler`] - `schedule_after(delay, task) -> TimerHandle`
//! - [`TimerHandle`] - cancellation handle (backed by `CancellationToken`)
//! - [`TokioScheduler`] - default implementation on a tokio runtime

mod timer;
mod runtime;

pub use runtime::TokioScheduler;
pub use timer::{Scheduler, TimerHandle, TimerTask};
