//! # Trigger counters.
//!
//! The engine reports four monotonic counters through an injected
//! [`StatsSink`]: triggers seen, misfires (no configuration at the fired
//! key), parse failures (configuration failed sanitization) and collisions
//! (an earlier run was still active). They are observability signals only —
//! nothing in the engine reads them back.
//!
//! Injecting the sink, rather than exporting process-wide statics, keeps
//! counters isolated per engine and per test. [`AtomicStats`] is the default
//! sink; hosts bridge to their own metrics pipeline by implementing
//! [`StatsSink`].

use std::sync::atomic::{AtomicU64, Ordering};

/// The counters the engine reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    /// A trigger fired for a job with a valid configuration.
    Triggers,
    /// A trigger fired but no configuration existed at that key.
    Misfires,
    /// A stored configuration failed sanitization.
    ParseFailures,
    /// A trigger collided with an unterminated prior run.
    Collisions,
}

/// Sink for monotonic counter increments.
///
/// Implementations must be cheap and non-blocking; the engine increments
/// from inside its decision transaction.
pub trait StatsSink: Send + Sync + 'static {
    /// Increments one counter by one.
    fn increment(&self, counter: Counter);
}

/// Default in-process sink backed by atomics.
#[derive(Debug, Default)]
pub struct AtomicStats {
    triggers: AtomicU64,
    misfires: AtomicU64,
    parse_failures: AtomicU64,
    collisions: AtomicU64,
}

impl AtomicStats {
    /// Creates a sink with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers seen for jobs with a valid configuration.
    pub fn triggers(&self) -> u64 {
        self.triggers.load(Ordering::Relaxed)
    }

    /// Firings with no configuration at the key.
    pub fn misfires(&self) -> u64 {
        self.misfires.load(Ordering::Relaxed)
    }

    /// Firings whose configuration failed sanitization.
    pub fn parse_failures(&self) -> u64 {
        self.parse_failures.load(Ordering::Relaxed)
    }

    /// Firings that collided with an unterminated prior run.
    pub fn collisions(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }
}

impl StatsSink for AtomicStats {
    fn increment(&self, counter: Counter) {
        let cell = match counter {
            Counter::Triggers => &self.triggers,
            Counter::Misfires => &self.misfires,
            Counter::ParseFailures => &self.parse_failures,
            Counter::Collisions => &self.collisions,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }
}
