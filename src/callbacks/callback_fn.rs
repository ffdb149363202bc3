//! # Function-backed callback (`CallbackFn`)
//!
//! [`CallbackFn`] wraps a closure `F: Fn(&Occurrence) -> Result<(), CallbackError>`.
//! Shared state goes into the closure explicitly (`Arc<...>`, atomics).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use unifier::{CallbackFn, CallbackRef, Occurrence};
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = hits.clone();
//! let cb: CallbackRef = CallbackFn::arc("counter", move |_occ: &Occurrence| {
//!     h.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! cb.call(&Occurrence::new("scroll")).unwrap();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! assert_eq!(cb.name(), "counter");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::callbacks::callback::{Callback, CallbackRef};
use crate::error::CallbackError;
use crate::targets::Occurrence;

/// Function-backed callback implementation.
pub struct CallbackFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> CallbackFn<F>
where
    F: Fn(&Occurrence) -> Result<(), CallbackError> + Send + Sync + 'static,
{
    /// Creates a new function-backed callback.
    ///
    /// Prefer [`CallbackFn::arc`] when you immediately need a [`CallbackRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the callback and returns it as a shared handle (`Arc<dyn Callback>`).
    ///
    /// Keep the returned handle: it is the identity `unregister` needs.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> CallbackRef {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Callback for CallbackFn<F>
where
    F: Fn(&Occurrence) -> Result<(), CallbackError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, occurrence: &Occurrence) -> Result<(), CallbackError> {
        (self.f)(occurrence)
    }
}

impl<F> std::fmt::Debug for CallbackFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackFn").field("name", &self.name).finish()
    }
}
