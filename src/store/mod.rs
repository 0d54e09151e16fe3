//! # Storage seam: stores, queries and the transactional executor.
//!
//! The engine never talks to a concrete database. It consumes three narrow
//! contracts:
//!
//! - [`StoreReader`] — read half: fetch a job configuration by key, fetch the
//!   task ids matching a [`TaskQuery`].
//! - [`StoreWriter`] — write half: additionally record new pending task
//!   instances.
//! - [`Storage`] — the transactional executor. `write` runs a closure over
//!   the mutable stores as **one atomic unit** with at-least-serializable
//!   isolation scoped to the job key; `read` runs a short consistent
//!   read-only closure.
//!
//! ## Rules
//! - The closure handed to [`Storage::write`] must be free of external side
//!   effects beyond store reads/writes (observability signals excepted):
//!   a real backend may retry or replay it.
//! - The termination poll of a deferred launch deliberately uses independent
//!   [`Storage::read`] calls, never one long transaction, so that kill
//!   completions can land between polls.
//!
//! [`MemStorage`] is the in-memory reference implementation; it doubles as
//! the crate's test harness and a starting point for embedding hosts.

mod memory;
mod query;
mod status;

pub use memory::{MemStateManager, MemStorage, ScheduledTask, StateChange};
pub use query::TaskQuery;
pub use status::TaskStatus;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::jobs::{JobConfig, PendingTaskSet};
use crate::keys::JobKey;

/// Opaque identifier of one scheduled task instance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Set of task ids observed active (non-terminal) at decision time.
pub type ActiveTaskIdSet = BTreeSet<TaskId>;

/// Read half of the store surface.
pub trait StoreReader {
    /// Fetches a job configuration by key. `None` when the key is unknown.
    fn fetch_job(&self, key: &JobKey) -> Option<JobConfig>;

    /// Returns the ids of tasks matching the query.
    fn fetch_task_ids(&self, query: &TaskQuery) -> ActiveTaskIdSet;
}

/// Write half of the store surface, available inside [`Storage::write`].
pub trait StoreWriter: StoreReader {
    /// Durably records new pending task instances for `key`.
    ///
    /// Idempotent per instance id within one transaction: inserting the same
    /// instance id twice in one call records it once.
    fn insert_pending_tasks(
        &mut self,
        key: &JobKey,
        pending: &PendingTaskSet,
    ) -> Result<(), StoreError>;
}

/// Transactional executor over the job and task stores.
///
/// Implementations guarantee that concurrent `write` calls for the **same**
/// job key never interleave, and that `read` observes no half-applied write.
/// `write` calls for different keys may proceed independently.
pub trait Storage: Send + Sync + 'static {
    /// Executes `work` as one atomic unit scoped to `key`.
    fn write<T, F>(&self, key: &JobKey, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn StoreWriter) -> T;

    /// Executes a short, consistent read-only query.
    fn read<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn StoreReader) -> T;
}
