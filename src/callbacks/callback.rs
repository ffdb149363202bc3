//! # Callback abstraction.
//!
//! A [`Callback`] is the consumer side of a subscription: it is invoked with the
//! captured [`Occurrence`] every time its record fans out.
//!
//! Callbacks are compared by **reference identity** ([`Arc::ptr_eq`] on [`CallbackRef`]).
//! Passing a freshly created callback to `unregister` that is not the exact handle
//! given to `register` removes nothing.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use unifier::{Callback, CallbackError, CallbackRef, Occurrence};
//!
//! struct Print;
//!
//! impl Callback for Print {
//!     fn name(&self) -> &str { "print" }
//!
//!     fn call(&self, occurrence: &Occurrence) -> Result<(), CallbackError> {
//!         println!("{}", occurrence.event_type);
//!         Ok(())
//!     }
//! }
//!
//! let cb: CallbackRef = Arc::new(Print);
//! assert_eq!(cb.name(), "print");
//! ```

use std::sync::Arc;

use crate::error::CallbackError;
use crate::targets::Occurrence;

/// Shared handle to a callback; identity is the allocation.
pub type CallbackRef = Arc<dyn Callback>;

/// # Synchronous fan-out consumer.
///
/// Invoked on whichever thread fires the fan-out (the low-level dispatch call for
/// synchronous records, a scheduler worker for throttled ones). Implementations
/// may call back into the service (`register`/`unregister`); the fan-out iterates
/// a snapshot, so such calls only affect later passes.
pub trait Callback: Send + Sync + 'static {
    /// Returns a stable, human-readable callback name used in errors and events.
    fn name(&self) -> &str;

    /// Handles one occurrence.
    ///
    /// Errors (and panics) are collected and surfaced; they never prevent sibling
    /// callbacks of the same pass from running.
    fn call(&self, occurrence: &Occurrence) -> Result<(), CallbackError>;
}

/// True when both handles point at the same callback allocation.
#[inline]
pub fn same_callback(a: &CallbackRef, b: &CallbackRef) -> bool {
    Arc::ptr_eq(a, b)
}
