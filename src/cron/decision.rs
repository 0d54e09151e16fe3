//! # The collision decision transaction.
//!
//! [`CollisionResolver::evaluate`] executes a single atomic unit of work
//! against the shared stores: fetch the job's configuration, sanitize it,
//! compute the configured task instances, inspect the currently active
//! instances, and decide what this firing does. When no prior run is active
//! the pending insert happens **inside the same transaction**, so concurrent
//! observers see fetch-decide-insert as one indivisible step.
//!
//! ## Rules
//! - Counter increments and log/event emission are observability signals
//!   only; the stores are the sole state the transaction mutates.
//! - Every degraded path (missing config, invalid config, skipping policy)
//!   resolves to [`Decision::NoOp`] — a lost firing, never a crashed one.
//! - The collision branch is dispatched through a handler table keyed by
//!   [`CollisionPolicy`], so adding a policy does not touch the transaction
//!   body.

use std::sync::Arc;

use crate::error::StoreError;
use crate::events::{Bus, Event, EventKind};
use crate::jobs::{PendingTaskSet, SanitizedCronJob};
use crate::keys::JobKey;
use crate::policies::CollisionPolicy;
use crate::stats::{Counter, StatsSink};
use crate::store::{ActiveTaskIdSet, Storage, StoreWriter, TaskQuery};

use super::launch::DeferredLaunch;

/// Outcome of one evaluation of a fired trigger.
#[derive(Debug)]
pub enum Decision {
    /// Nothing to launch for this firing.
    NoOp,
    /// Pending tasks were inserted within the decision transaction; the
    /// caller has nothing further to do.
    Launched,
    /// A prior run must be killed first; the launch is deferred.
    Deferred(DeferredLaunch),
}

/// Executes the decision transaction for fired triggers.
pub(crate) struct CollisionResolver<S> {
    storage: Arc<S>,
    stats: Arc<dyn StatsSink>,
    bus: Bus,
}

impl<S: Storage> CollisionResolver<S> {
    pub(crate) fn new(storage: Arc<S>, stats: Arc<dyn StatsSink>, bus: Bus) -> Self {
        Self {
            storage,
            stats,
            bus,
        }
    }

    /// Evaluates one firing for `key` as a single atomic transaction.
    pub(crate) fn evaluate(&self, key: &JobKey) -> Result<Decision, StoreError> {
        self.storage.write(key, |stores| self.decide(key, stores))?
    }

    fn decide(&self, key: &JobKey, stores: &mut dyn StoreWriter) -> Result<Decision, StoreError> {
        let Some(config) = stores.fetch_job(key) else {
            tracing::warn!(
                job = %key,
                "cron was triggered but no job with that key was found in storage"
            );
            self.stats.increment(Counter::Misfires);
            self.bus.publish(
                Event::new(EventKind::Misfired)
                    .with_job(key.to_string())
                    .with_reason("no job with that key was found in storage"),
            );
            return Ok(Decision::NoOp);
        };

        let job = match SanitizedCronJob::from_unsanitized(config) {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(
                    job = %key,
                    error = %err,
                    "invalid cron job in storage - failed to sanitize"
                );
                self.stats.increment(Counter::ParseFailures);
                self.bus.publish(
                    Event::new(EventKind::ConfigRejected)
                        .with_job(key.to_string())
                        .with_reason(err.to_string()),
                );
                return Ok(Decision::NoOp);
            }
        };

        let policy = job.collision_policy();
        tracing::info!(job = %key, policy = %policy, "cron triggered");
        self.stats.increment(Counter::Triggers);
        self.bus.publish(
            Event::new(EventKind::TriggerFired)
                .with_job(key.to_string())
                .with_policy(policy),
        );

        let pending = job.pending_task_set();
        let active = stores.fetch_task_ids(&TaskQuery::job_scoped(key.clone()).active());

        if active.is_empty() {
            stores.insert_pending_tasks(key, &pending)?;
            self.bus.publish(
                Event::new(EventKind::TasksLaunched)
                    .with_job(key.to_string())
                    .with_count(pending.len() as u32),
            );
            return Ok(Decision::Launched);
        }

        self.stats.increment(Counter::Collisions);
        self.bus.publish(
            Event::new(EventKind::CollisionDetected)
                .with_job(key.to_string())
                .with_policy(policy)
                .with_count(active.len() as u32),
        );

        let cx = PolicyCx { key, policy };
        Ok(handler_for(policy)(&cx, pending, active))
    }
}

/// Context handed to a collision policy handler.
struct PolicyCx<'a> {
    key: &'a JobKey,
    policy: CollisionPolicy,
}

/// One entry of the collision handler table.
type PolicyHandler = for<'a> fn(&PolicyCx<'a>, PendingTaskSet, ActiveTaskIdSet) -> Decision;

/// Dispatch table: collision policy → handler.
fn handler_for(policy: CollisionPolicy) -> PolicyHandler {
    match policy {
        CollisionPolicy::KillExisting => kill_existing,
        CollisionPolicy::CancelNew => cancel_new,
        CollisionPolicy::RunOverlap => run_overlap,
        CollisionPolicy::Unknown(_) => unrecognized,
    }
}

fn kill_existing(_cx: &PolicyCx<'_>, pending: PendingTaskSet, active: ActiveTaskIdSet) -> Decision {
    Decision::Deferred(DeferredLaunch::new(pending, active))
}

fn cancel_new(_cx: &PolicyCx<'_>, _pending: PendingTaskSet, _active: ActiveTaskIdSet) -> Decision {
    Decision::NoOp
}

fn run_overlap(cx: &PolicyCx<'_>, _pending: PendingTaskSet, _active: ActiveTaskIdSet) -> Decision {
    tracing::error!(
        job = %cx.key,
        "ignoring trigger with deprecated collision policy run_overlap due to unterminated active tasks"
    );
    Decision::NoOp
}

fn unrecognized(cx: &PolicyCx<'_>, _pending: PendingTaskSet, _active: ActiveTaskIdSet) -> Decision {
    tracing::error!(job = %cx.key, policy = %cx.policy, "unrecognized cron collision policy");
    Decision::NoOp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobConfig, Resources, TaskConfig};
    use crate::stats::AtomicStats;
    use crate::store::{MemStorage, ScheduledTask, TaskId, TaskStatus};

    fn key(name: &str) -> JobKey {
        JobKey::new("role", "env", name).unwrap()
    }

    fn job_config(name: &str, policy: CollisionPolicy) -> JobConfig {
        JobConfig {
            key: key(name),
            schedule: "0 * * * *".to_string(),
            collision_policy: policy,
            instance_count: 2,
            task: TaskConfig {
                command: "run".to_string(),
                resources: Resources {
                    cpus: 1.0,
                    ram_mb: 64,
                    disk_mb: 64,
                },
            },
        }
    }

    fn resolver(storage: &Arc<MemStorage>) -> (CollisionResolver<MemStorage>, Arc<AtomicStats>) {
        let stats = Arc::new(AtomicStats::new());
        let bus = Bus::new(16);
        (
            CollisionResolver::new(storage.clone(), stats.clone(), bus),
            stats,
        )
    }

    fn seed_active(storage: &MemStorage, name: &str, id: &str) {
        storage
            .seed_task(ScheduledTask {
                id: TaskId::from(id),
                key: key(name),
                instance: 0,
                status: TaskStatus::Running,
                config: job_config(name, CollisionPolicy::KillExisting).task,
            })
            .unwrap();
    }

    #[test]
    fn missing_config_is_a_counted_noop() {
        let storage = Arc::new(MemStorage::new());
        let (resolver, stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("ghost")).unwrap();
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(stats.misfires(), 1);
        assert_eq!(stats.triggers(), 0);
        assert_eq!(storage.task_count().unwrap(), 0);
    }

    #[test]
    fn invalid_config_is_a_counted_noop() {
        let storage = Arc::new(MemStorage::new());
        let mut config = job_config("bad", CollisionPolicy::KillExisting);
        config.instance_count = 0;
        storage.insert_job(config).unwrap();
        let (resolver, stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("bad")).unwrap();
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(stats.parse_failures(), 1);
        assert_eq!(stats.triggers(), 0);
        assert_eq!(storage.task_count().unwrap(), 0);
    }

    #[test]
    fn empty_active_set_launches_within_the_transaction() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("fresh", CollisionPolicy::KillExisting))
            .unwrap();
        let (resolver, stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("fresh")).unwrap();
        assert!(matches!(decision, Decision::Launched));
        assert_eq!(stats.triggers(), 1);
        assert_eq!(stats.collisions(), 0);

        let tasks = storage.tasks_for_job(&key("fresh")).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn kill_existing_collision_defers_the_launch() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("busy", CollisionPolicy::KillExisting))
            .unwrap();
        seed_active(&storage, "busy", "task-old");
        let (resolver, stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("busy")).unwrap();
        let Decision::Deferred(deferred) = decision else {
            panic!("expected a deferred launch");
        };
        assert_eq!(deferred.pending().len(), 2);
        assert!(deferred.active().contains(&TaskId::from("task-old")));
        assert_eq!(stats.collisions(), 1);

        // The deferred decision itself must not have touched the task set.
        assert_eq!(storage.task_count().unwrap(), 1);
    }

    #[test]
    fn cancel_new_collision_leaves_the_active_run_untouched() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("busy", CollisionPolicy::CancelNew))
            .unwrap();
        seed_active(&storage, "busy", "task-old");
        let (resolver, stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("busy")).unwrap();
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(stats.collisions(), 1);
        assert_eq!(storage.task_count().unwrap(), 1);
        assert_eq!(
            storage.task(&TaskId::from("task-old")).unwrap().unwrap().status,
            TaskStatus::Running
        );
    }

    #[test]
    fn run_overlap_collision_is_a_legacy_noop() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("busy", CollisionPolicy::RunOverlap))
            .unwrap();
        seed_active(&storage, "busy", "task-old");
        let (resolver, _stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("busy")).unwrap();
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(storage.task_count().unwrap(), 1);
    }

    #[test]
    fn unrecognized_policy_is_a_defensive_noop() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("busy", CollisionPolicy::Unknown(9)))
            .unwrap();
        seed_active(&storage, "busy", "task-old");
        let (resolver, _stats) = resolver(&storage);

        let decision = resolver.evaluate(&key("busy")).unwrap();
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(storage.task_count().unwrap(), 1);
    }

    #[test]
    fn relaunch_over_own_pending_tasks_follows_the_collision_branch() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("again", CollisionPolicy::CancelNew))
            .unwrap();
        let (resolver, stats) = resolver(&storage);

        assert!(matches!(
            resolver.evaluate(&key("again")).unwrap(),
            Decision::Launched
        ));
        assert_eq!(storage.task_count().unwrap(), 2);

        // The freshly inserted tasks are still active, so a second firing
        // must not duplicate them.
        assert!(matches!(
            resolver.evaluate(&key("again")).unwrap(),
            Decision::NoOp
        ));
        assert_eq!(storage.task_count().unwrap(), 2);
        assert_eq!(stats.collisions(), 1);
    }
}
