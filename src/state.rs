//! # State manager seam.
//!
//! The engine never terminates a task itself. Killing the prior run of a job
//! means asking the cluster's state manager for a transition into
//! [`TaskStatus::Killing`]; the actual teardown, and the task's eventual
//! departure from the active set, happen elsewhere and are observed through
//! the task store.

use crate::store::{TaskId, TaskStatus};

/// Contract for requesting task state transitions.
///
/// Implementations must treat `change_state` as a **non-blocking request**:
/// it returns as soon as the transition has been recorded/enqueued, never
/// waiting for the transition to complete. The engine relies on this when it
/// issues one kill request per active task before entering its poll loop.
pub trait StateManager: Send + Sync + 'static {
    /// Requests an asynchronous state transition for one task.
    ///
    /// ### Parameters
    /// - `task_id`: the task to transition
    /// - `from`: expected current status; `None` makes the request
    ///   unconditional
    /// - `to`: requested target status
    /// - `audit`: optional annotation recorded with the transition
    fn change_state(
        &self,
        task_id: &TaskId,
        from: Option<TaskStatus>,
        to: TaskStatus,
        audit: Option<&str>,
    );
}
