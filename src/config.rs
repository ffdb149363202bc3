//! # Service configuration.
//!
//! Provides [`Config`] centralized settings for a [`UnifiedEventService`](crate::UnifiedEventService).
//!
//! Config is used in two ways:
//! 1. **Service creation**: `UnifiedEventService::builder(config, resolver)`
//! 2. **Record defaults**: `register()` uses [`Config::interval`] for newly created records
//!
//! ## Sentinel values
//! - `interval = 0s` → no throttling, fan-out runs synchronously inside the low-level listener
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Default throttle window for fan-out.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Global configuration for the unified event service.
///
/// ## Field semantics
/// - `interval`: Default throttle window applied to newly created records (`0s` = synchronous)
/// - `bus_capacity`: Lifecycle event bus ring buffer size (min 1; clamped by Bus)
/// - `headless`: When `true`, `register`/`unregister` are silent no-ops
#[derive(Clone, Debug)]
pub struct Config {
    /// Default throttle interval for records created by `register()`.
    ///
    /// Only consulted when a record is created; an existing record keeps
    /// the interval of its first subscriber.
    pub interval: Duration,

    /// Capacity of the lifecycle event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Non-interactive execution context (server rendering, batch jobs).
    ///
    /// No low-level listeners can be attached there, so registration is skipped silently.
    pub headless: bool,
}

impl Config {
    /// Deterministic configuration: no throttling, every occurrence fans out immediately.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `interval = 50ms`
    /// - `bus_capacity = 1024`
    /// - `headless = false`
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            bus_capacity: 1024,
            headless: false,
        }
    }
}
