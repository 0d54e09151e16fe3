//! # Engine configuration.
//!
//! Provides [`CronConfig`] centralized settings for the trigger engine.
//!
//! ## Sentinel values
//! - `poll_limit = 0` → unbounded polling (wait as long as it takes)
//! - `bus_capacity` is clamped to a minimum of 1 by the event bus

use crate::policies::BackoffPolicy;

/// Configuration for a [`CronEngine`](crate::CronEngine).
///
/// Defines:
/// - **Delayed-launch pacing**: backoff between termination polls
/// - **Wait bounds**: optional cap on the number of polls
/// - **Event system**: bus capacity for lifecycle event delivery
///
/// ## Field semantics
/// - `backoff`: delay schedule for the kill-then-wait poll loop
/// - `poll_limit`: maximum termination polls per deferred launch (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
#[derive(Clone, Debug)]
pub struct CronConfig {
    /// Delay schedule between termination polls of a deferred launch.
    pub backoff: BackoffPolicy,

    /// Maximum number of termination polls per deferred launch.
    ///
    /// - `0` = unbounded: keep polling until the prior run terminates or the
    ///   invocation is cancelled
    /// - `n > 0` = give up after `n` polls with a retryable error; the next
    ///   scheduled firing starts over
    pub poll_limit: u32,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// skip over the oldest ones. Minimum value is 1 (enforced by the bus).
    pub bus_capacity: usize,
}

impl CronConfig {
    /// Returns the poll limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` termination polls
    #[inline]
    pub fn poll_limit(&self) -> Option<u32> {
        if self.poll_limit == 0 {
            None
        } else {
            Some(self.poll_limit)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for CronConfig {
    /// Default configuration:
    ///
    /// - `backoff = BackoffPolicy::default()` (1s doubling to 60s)
    /// - `poll_limit = 0` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            poll_limit: 0,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_limit_means_unbounded() {
        let config = CronConfig::default();
        assert_eq!(config.poll_limit(), None);

        let config = CronConfig {
            poll_limit: 5,
            ..CronConfig::default()
        };
        assert_eq!(config.poll_limit(), Some(5));
    }
}
