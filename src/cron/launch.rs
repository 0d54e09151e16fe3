//! # The delayed-launch supervisor.
//!
//! Entered only when the decision transaction returns
//! [`Decision::Deferred`](super::Decision::Deferred): a prior run of the job
//! is still active and the collision policy says to kill it first.
//!
//! The supervisor issues exactly one kill request per active task id, then
//! polls — backoff-paced, cancellable, one short read per probe — until the
//! captured id set no longer matches any active task. Only then are the
//! pending tasks inserted. Launching while a kill is still in flight would
//! let two runs of the same job overlap, so the wait is never skipped.
//!
//! ## Rules
//! - The poll loop is **not** one long transaction: each probe is an
//!   independent read, letting the kill completions land between probes.
//! - Cancellation aborts before the insert and surfaces a retryable error;
//!   the firing is lost and the next trigger starts over.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{CronError, RetryError};
use crate::events::{Bus, Event, EventKind};
use crate::jobs::PendingTaskSet;
use crate::keys::JobKey;
use crate::policies::BackoffPolicy;
use crate::retry::retry_until;
use crate::state::StateManager;
use crate::store::{ActiveTaskIdSet, Storage, TaskQuery, TaskStatus};

/// Audit annotation attached to every kill the supervisor requests.
pub const KILL_AUDIT_MESSAGE: &str = "Killed by cronScheduler";

/// A launch postponed until the prior run's tasks are gone.
///
/// Invariant: `active` is non-empty — the value only exists when a collision
/// was observed.
#[derive(Debug)]
pub struct DeferredLaunch {
    pending: PendingTaskSet,
    active: ActiveTaskIdSet,
}

impl DeferredLaunch {
    pub(crate) fn new(pending: PendingTaskSet, active: ActiveTaskIdSet) -> Self {
        debug_assert!(!active.is_empty(), "deferred launch with no active tasks");
        Self { pending, active }
    }

    /// The instances to insert once the wait succeeds.
    pub fn pending(&self) -> &PendingTaskSet {
        &self.pending
    }

    /// The active task ids that must terminate first.
    pub fn active(&self) -> &ActiveTaskIdSet {
        &self.active
    }
}

/// Kills the prior run, waits for it to drain, performs the launch.
pub(crate) struct DelayedLauncher<S> {
    storage: Arc<S>,
    state: Arc<dyn StateManager>,
    backoff: BackoffPolicy,
    poll_limit: Option<u32>,
    bus: Bus,
}

impl<S: Storage> DelayedLauncher<S> {
    pub(crate) fn new(
        storage: Arc<S>,
        state: Arc<dyn StateManager>,
        backoff: BackoffPolicy,
        poll_limit: Option<u32>,
        bus: Bus,
    ) -> Self {
        Self {
            storage,
            state,
            backoff,
            poll_limit,
            bus,
        }
    }

    /// Runs the kill-then-wait-then-launch sequence to completion, abort, or
    /// cancellation.
    pub(crate) async fn run(
        &self,
        key: &JobKey,
        launch: DeferredLaunch,
        token: &CancellationToken,
    ) -> Result<(), CronError> {
        for id in launch.active() {
            self.state
                .change_state(id, None, TaskStatus::Killing, Some(KILL_AUDIT_MESSAGE));
            self.bus.publish(
                Event::new(EventKind::KillRequested)
                    .with_job(key.to_string())
                    .with_task(id.as_str()),
            );
        }
        tracing::info!(
            job = %key,
            active = launch.active().len(),
            "waiting for prior run to terminate before launching cron job"
        );

        let query = TaskQuery::task_scoped(launch.active().clone()).active();
        let storage = &self.storage;
        let wait = retry_until(&self.backoff, token, self.poll_limit, || {
            let drained = storage
                .read(|s| s.fetch_task_ids(&query).is_empty())
                .unwrap_or(false);
            if !drained {
                tracing::debug!(job = %key, "not yet safe to run cron job");
            }
            drained
        })
        .await;

        match wait {
            Ok(_polls) => {
                tracing::info!(job = %key, "initiating delayed launch of cron job");
                self.storage
                    .write(key, |stores| stores.insert_pending_tasks(key, launch.pending()))??;
                self.bus.publish(
                    Event::new(EventKind::TasksLaunched)
                        .with_job(key.to_string())
                        .with_count(launch.pending().len() as u32),
                );
                Ok(())
            }
            Err(RetryError::Cancelled) => {
                tracing::warn!(job = %key, "interrupted while waiting to launch cron job");
                self.bus.publish(
                    Event::new(EventKind::LaunchAborted)
                        .with_job(key.to_string())
                        .with_reason("cancelled"),
                );
                Err(CronError::Interrupted { key: key.clone() })
            }
            Err(RetryError::Exhausted { attempts }) => {
                tracing::warn!(
                    job = %key,
                    attempts,
                    "gave up waiting for prior run to terminate"
                );
                self.bus.publish(
                    Event::new(EventKind::LaunchAborted)
                        .with_job(key.to_string())
                        .with_reason("wait exhausted"),
                );
                Err(CronError::WaitExhausted {
                    key: key.clone(),
                    attempts,
                })
            }
        }
    }
}
