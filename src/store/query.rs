//! # Task queries.
//!
//! [`TaskQuery`] is the predicate the engine hands to the task store: scoped
//! either to one job key or to an explicit id set, optionally restricted to
//! active (non-terminal) statuses.
//!
//! ## Example
//! ```rust
//! use cronvisor::{JobKey, TaskQuery};
//!
//! let key = JobKey::new("ads", "prod", "rollup").unwrap();
//! let query = TaskQuery::job_scoped(key).active();
//! assert!(query.active_only());
//! ```

use std::collections::BTreeSet;

use crate::keys::JobKey;
use crate::store::status::TaskStatus;
use crate::store::TaskId;

/// What a query is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Scope {
    /// All tasks belonging to one job key.
    Job(JobKey),
    /// Tasks whose id is in the set, regardless of owning job.
    Tasks(BTreeSet<TaskId>),
}

/// Predicate over scheduled tasks.
///
/// Built with [`TaskQuery::job_scoped`] or [`TaskQuery::task_scoped`], then
/// optionally narrowed with [`TaskQuery::active`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskQuery {
    scope: Scope,
    active_only: bool,
}

impl TaskQuery {
    /// All tasks of one job.
    pub fn job_scoped(key: JobKey) -> Self {
        Self {
            scope: Scope::Job(key),
            active_only: false,
        }
    }

    /// Tasks whose id is in `ids`.
    pub fn task_scoped(ids: BTreeSet<TaskId>) -> Self {
        Self {
            scope: Scope::Tasks(ids),
            active_only: false,
        }
    }

    /// Restricts the query to active (non-terminal) statuses.
    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Whether the query is restricted to active statuses.
    pub fn active_only(&self) -> bool {
        self.active_only
    }

    /// Evaluates the predicate against one task's identity and status.
    pub fn matches(&self, id: &TaskId, key: &JobKey, status: TaskStatus) -> bool {
        if self.active_only && !status.is_active() {
            return false;
        }
        match &self.scope {
            Scope::Job(job_key) => job_key == key,
            Scope::Tasks(ids) => ids.contains(id),
        }
    }
}
