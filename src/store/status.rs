//! # Task lifecycle statuses.
//!
//! [`TaskStatus`] partitions a task's lifecycle into **active**
//! (non-terminal) and **terminal** states. A cron collision exists exactly
//! when a prior run still has tasks in an active status — including
//! `Killing`, which is why a deferred launch must keep polling until the
//! killed tasks actually leave the active set.
//!
//! ```text
//! active:   Pending → Assigned → Starting → Running → Killing
//! terminal: Finished | Failed | Killed | Lost
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of one scheduled task instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Recorded for launch, not yet placed on cluster resources.
    Pending,
    /// Placed on a host, not yet starting.
    Assigned,
    /// Starting up on its host.
    Starting,
    /// Running.
    Running,
    /// A kill was requested; the task has not yet terminated.
    Killing,
    /// Terminated successfully.
    Finished,
    /// Terminated with an error.
    Failed,
    /// Terminated by a kill.
    Killed,
    /// The cluster lost track of the task.
    Lost,
}

impl TaskStatus {
    /// True for non-terminal statuses. A job with any active task is
    /// considered to have an unterminated run.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// True once the task can never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Finished | TaskStatus::Failed | TaskStatus::Killed | TaskStatus::Lost
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Starting => "starting",
            TaskStatus::Running => "running",
            TaskStatus::Killing => "killing",
            TaskStatus::Finished => "finished",
            TaskStatus::Failed => "failed",
            TaskStatus::Killed => "killed",
            TaskStatus::Lost => "lost",
        };
        f.write_str(s)
    }
}
