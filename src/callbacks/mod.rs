//! # Callback abstractions.
//!
//! - [`Callback`] - trait implemented by fan-out consumers
//! - [`CallbackFn`] - closure-backed implementation
//! - [`CallbackRef`] - shared handle (`Arc<dyn Callback>`); its allocation is the identity

mod callback;
mod callback_fn;

pub use callback::{Callback, CallbackRef, same_callback};
pub use callback_fn::CallbackFn;
