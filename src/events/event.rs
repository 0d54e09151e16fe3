//! # Lifecycle events emitted by trigger invocations.
//!
//! The [`EventKind`] enum classifies what happened at each step of a firing:
//! the decision taken, kills requested, tasks launched, launches abandoned.
//! The [`Event`] struct carries metadata such as timestamps, the job key,
//! task ids, the collision policy and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use cronvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Misfired)
//!     .with_job("ads/prod/rollup")
//!     .with_reason("no job with that key was found");
//!
//! assert_eq!(ev.kind, EventKind::Misfired);
//! assert_eq!(ev.job.as_deref(), Some("ads/prod/rollup"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::policies::CollisionPolicy;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of trigger lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A trigger fired for a job with a valid configuration.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `policy`: the job's collision policy
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TriggerFired,

    /// A trigger fired but no configuration existed at that key.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `reason`: description of the misfire
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Misfired,

    /// The stored configuration failed sanitization.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `reason`: the validation error
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ConfigRejected,

    /// The firing collided with an unterminated prior run.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `policy`: the collision policy that decides the branch
    /// - `count`: number of active tasks observed
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CollisionDetected,

    /// A kill was requested for one active task of the prior run.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `task`: id of the task being killed
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    KillRequested,

    /// Pending tasks were inserted (immediately or after a deferred wait).
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `count`: number of instances inserted
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TasksLaunched,

    /// A deferred launch was abandoned before insertion.
    ///
    /// Sets:
    /// - `job`: canonical job key
    /// - `reason`: why the launch was abandoned (cancelled, exhausted)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    LaunchAborted,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Canonical job key, if applicable.
    pub job: Option<Arc<str>>,
    /// Task id, if applicable.
    pub task: Option<Arc<str>>,
    /// Collision policy in effect, if applicable.
    pub policy: Option<CollisionPolicy>,
    /// Task/instance count, if applicable.
    pub count: Option<u32>,
    /// Human-readable reason (validation errors, abort causes, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            task: None,
            policy: None,
            count: None,
            reason: None,
        }
    }

    /// Attaches the canonical job key.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the collision policy in effect.
    #[inline]
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attaches a task/instance count.
    #[inline]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic() {
        let a = Event::new(EventKind::TriggerFired);
        let b = Event::new(EventKind::TriggerFired);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builder_setters_attach_metadata() {
        let ev = Event::new(EventKind::CollisionDetected)
            .with_job("r/e/n")
            .with_policy(CollisionPolicy::CancelNew)
            .with_count(2);
        assert_eq!(ev.job.as_deref(), Some("r/e/n"));
        assert_eq!(ev.policy, Some(CollisionPolicy::CancelNew));
        assert_eq!(ev.count, Some(2));
        assert!(ev.task.is_none());
    }
}
