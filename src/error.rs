//! Error types used by the unified event service and its callbacks.
//!
//! This module defines the error enums:
//!
//! - [`ResolutionError`] - a target identifier could not be resolved to an event-capable object.
//! - [`CallbackError`] - a user callback failed (or panicked) during fan-out.
//! - [`FanoutError`] - every callback failure collected from one fan-out pass.
//! - [`ServiceError`] - the service could not be built.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced while resolving a target.
///
/// Raised synchronously from `register` when a record would have to be created.
/// Never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The identifier is not a usable selector (empty or whitespace only).
    #[error("targets are looked up via a selector string; got {target:?}")]
    InvalidTarget {
        /// The rejected identifier.
        target: String,
    },

    /// The selector is well-formed but nothing is addressable under it.
    #[error("the target selector {target:?} was passed, but could not be resolved")]
    NotFound {
        /// The selector that matched nothing.
        target: String,
    },
}

impl ResolutionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unifier::ResolutionError;
    ///
    /// let err = ResolutionError::NotFound { target: ".missing".into() };
    /// assert_eq!(err.as_label(), "target_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolutionError::InvalidTarget { .. } => "target_invalid",
            ResolutionError::NotFound { .. } => "target_not_found",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ResolutionError::InvalidTarget { target } => format!("invalid target: {target:?}"),
            ResolutionError::NotFound { target } => format!("not found: {target:?}"),
        }
    }
}

/// # Errors produced by callback invocation.
///
/// A failing callback never stops delivery to its siblings in the same fan-out.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Callback returned an error.
    #[error("callback {callback:?} failed: {error}")]
    Failed {
        /// Name of the failing callback.
        callback: String,
        /// The underlying error message.
        error: String,
    },

    /// Callback panicked; the panic was caught at the fan-out boundary.
    #[error("callback {callback:?} panicked: {info}")]
    Panicked {
        /// Name of the panicking callback.
        callback: String,
        /// Panic payload rendered as text.
        info: String,
    },
}

impl CallbackError {
    /// Convenience constructor for callbacks that want to report a failure.
    pub fn failed(callback: impl Into<String>, error: impl ToString) -> Self {
        CallbackError::Failed {
            callback: callback.into(),
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Failed { .. } => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Failed { error, .. } => format!("error: {error}"),
            CallbackError::Panicked { info, .. } => format!("panic: {info}"),
        }
    }

    /// Name of the callback that produced this error.
    pub fn callback(&self) -> &str {
        match self {
            CallbackError::Failed { callback, .. } | CallbackError::Panicked { callback, .. } => {
                callback
            }
        }
    }
}

/// # Callback failures collected from one or more fan-out passes.
///
/// Returned to whoever originated the occurrence (low-level dispatch, `trigger`).
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{} callback(s) failed during fan-out", .failures.len())]
pub struct FanoutError {
    /// Failures in invocation order.
    pub failures: Vec<CallbackError>,
}

impl FanoutError {
    /// Wraps the failures; `Ok(())` when there are none.
    pub fn check(failures: Vec<CallbackError>) -> Result<(), FanoutError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FanoutError { failures })
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "fanout_failed"
    }

    /// Returns a human-readable message listing every failure.
    pub fn as_message(&self) -> String {
        let parts: Vec<String> = self.failures.iter().map(|f| f.to_string()).collect();
        parts.join("; ")
    }
}

/// # Errors produced while building the service.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The default tokio scheduler was requested outside a tokio runtime.
    #[error("no tokio runtime available for the default scheduler: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::NoRuntime(_) => "service_no_runtime",
        }
    }
}
