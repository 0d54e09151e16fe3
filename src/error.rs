//! Error types used by the cronvisor engine and its collaborators.
//!
//! This module defines the error enums for each seam of the engine:
//!
//! - [`CronError`] — failures of a single trigger invocation.
//! - [`KeyError`] — malformed job keys.
//! - [`InvalidJob`] — stored configurations that fail sanitization.
//! - [`StoreError`] — failures of the storage seam.
//! - [`RetryError`] — outcomes of an abandoned backoff wait.
//!
//! Every failure here degrades to "skip this firing": the recurring schedule
//! is managed by the host and will fire again, so nothing in this crate is
//! meant to terminate the hosting process. [`CronError::is_retryable`] tells
//! the host whether the next firing is expected to recover on its own.

use thiserror::Error;

use crate::keys::JobKey;

/// # Errors produced by a single trigger invocation.
///
/// A trigger that returns an error has launched nothing; the firing is lost
/// and the next scheduled trigger re-runs the whole evaluate-and-launch
/// sequence.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CronError {
    /// The delayed-launch wait was cancelled before the prior run terminated.
    ///
    /// The deferred launch is abandoned; no pending tasks were inserted.
    #[error("interrupted while waiting to launch cron {key}")]
    Interrupted {
        /// Key of the job whose launch was abandoned.
        key: JobKey,
    },

    /// The delayed-launch wait ran out of poll attempts before the prior run
    /// terminated.
    ///
    /// Only produced when a poll limit is configured; no pending tasks were
    /// inserted.
    #[error("gave up waiting to launch cron {key} after {attempts} polls")]
    WaitExhausted {
        /// Key of the job whose launch was abandoned.
        key: JobKey,
        /// Number of polls performed before giving up.
        attempts: u32,
    },

    /// The storage seam failed while evaluating or launching.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl CronError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CronError::Interrupted { .. } => "cron_interrupted",
            CronError::WaitExhausted { .. } => "cron_wait_exhausted",
            CronError::Store(_) => "cron_store_failure",
        }
    }

    /// Indicates whether the next scheduled firing is expected to recover.
    ///
    /// All current variants are retryable: the trigger is re-evaluated from
    /// scratch on the next firing, so transient waits and storage hiccups
    /// resolve themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CronError::Interrupted { .. } | CronError::WaitExhausted { .. } | CronError::Store(_)
        )
    }
}

/// # Errors produced when building or parsing a [`JobKey`].
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    /// A key component is empty, too long, or contains a forbidden character.
    #[error("bad {component} identifier: {value:?}")]
    BadIdentifier {
        /// Which component failed (`role`, `environment` or `name`).
        component: &'static str,
        /// The offending value.
        value: String,
    },

    /// A canonical string did not split into exactly three components.
    #[error("bad job key format: {0:?} (want role/environment/name)")]
    BadFormat(String),
}

/// # Errors produced when sanitizing a stored job configuration.
///
/// A configuration that fails sanitization is never launched; the trigger
/// degrades to a no-op and the parse-failure counter is incremented.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq)]
pub enum InvalidJob {
    /// The stored schedule line is empty.
    #[error("job has an empty schedule")]
    EmptySchedule,

    /// The job is configured with zero task instances.
    #[error("job has no task instances")]
    NoInstances,

    /// The job asks for more instances than the engine permits.
    #[error("job asks for {requested} instances (limit {limit})")]
    TooManyInstances {
        /// Number of instances the configuration requested.
        requested: u32,
        /// Maximum number of instances the engine permits.
        limit: u32,
    },

    /// The task template has an empty command line.
    #[error("task has an empty command")]
    EmptyCommand,

    /// A task resource dimension is zero, negative, or not finite.
    #[error("bad task resources: {detail}")]
    BadResources {
        /// Which dimension failed and why.
        detail: String,
    },
}

/// # Errors produced by the storage seam.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// An internal store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// # Outcome of an abandoned [`retry_until`](crate::retry::retry_until) wait.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetryError {
    /// The cancellation token fired before the condition held.
    #[error("retry cancelled")]
    Cancelled,

    /// The configured attempt limit was reached before the condition held.
    #[error("retry exhausted after {attempts} attempts")]
    Exhausted {
        /// Number of condition evaluations performed.
        attempts: u32,
    },
}
