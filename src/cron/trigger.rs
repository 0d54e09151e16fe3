//! # Trigger entry point.
//!
//! [`CronEngine`] is the single surface the host's cron-firing mechanism
//! calls. Each invocation drives one firing through its state machine:
//!
//! ```text
//! trigger(key, token)
//!   → acquire key lock
//!   → evaluate
//!       → NoOp                         → Skipped            (terminal)
//!       → Launched                     → Launched           (terminal)
//!       → Deferred → kill → poll loop
//!           → insert pending           → LaunchedAfterKill  (terminal)
//!           → cancelled / exhausted    → Err (retryable)    (terminal)
//! ```
//!
//! ## Rules
//! - Invocations for the **same** job key serialize on the engine's lock
//!   map; a firing that arrives while a deferred launch for the same key is
//!   still waiting simply queues behind it. Different keys never contend.
//! - A deferred launch suspends its invocation for as long as the prior run
//!   takes to terminate. Hosts should drive triggers on a runtime with
//!   enough concurrency (spawned tasks, not a tiny worker pool) so waiting
//!   launches cannot starve unrelated jobs.
//! - A trigger never panics the host: every failure is an `Err` that the
//!   next scheduled firing retries from scratch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::config::CronConfig;
use crate::error::CronError;
use crate::events::Bus;
use crate::keys::JobKey;
use crate::state::StateManager;
use crate::stats::{AtomicStats, StatsSink};
use crate::store::Storage;
use crate::subscribers::Subscriber;

use super::decision::{CollisionResolver, Decision};
use super::launch::DelayedLauncher;

/// How one trigger invocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing was launched: missing or invalid configuration, or a
    /// collision policy that skips the firing.
    Skipped,
    /// Pending tasks were inserted immediately (no active prior run).
    Launched,
    /// The prior run was killed and drained first, then tasks were inserted.
    LaunchedAfterKill,
}

/// Per-job-key invocation locks.
///
/// Serializes firings for the same key so one invocation's kill can never
/// race another invocation's launch for that key. The map only ever grows
/// by one small entry per distinct job key.
struct KeyLocks {
    inner: Mutex<HashMap<JobKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: &JobKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// The cron trigger engine.
///
/// Owns the decision transaction, the delayed-launch supervisor, the event
/// bus and the per-key locks. Construct with [`CronEngine::builder`].
pub struct CronEngine<S: Storage> {
    resolver: CollisionResolver<S>,
    launcher: DelayedLauncher<S>,
    bus: Bus,
    locks: KeyLocks,
}

impl<S: Storage> CronEngine<S> {
    /// Starts building an engine over the given storage and state manager.
    pub fn builder(storage: Arc<S>, state: Arc<dyn StateManager>) -> CronEngineBuilder<S> {
        CronEngineBuilder::new(storage, state)
    }

    /// The engine's event bus, for attaching ad-hoc receivers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Handles one firing of the trigger for `key`.
    ///
    /// Runs the decision transaction and, when the decision defers the
    /// launch, the kill-then-wait supervisor to completion, abort, or
    /// cancellation. The returned error is always retryable: the firing is
    /// lost and the next scheduled trigger re-runs the whole sequence.
    pub async fn trigger(
        &self,
        key: &JobKey,
        token: &CancellationToken,
    ) -> Result<TriggerOutcome, CronError> {
        let _guard = self.locks.acquire(key).await;
        if token.is_cancelled() {
            return Err(CronError::Interrupted { key: key.clone() });
        }

        match self.resolver.evaluate(key)? {
            Decision::NoOp => Ok(TriggerOutcome::Skipped),
            Decision::Launched => Ok(TriggerOutcome::Launched),
            Decision::Deferred(launch) => {
                self.launcher.run(key, launch, token).await?;
                Ok(TriggerOutcome::LaunchedAfterKill)
            }
        }
    }
}

/// Builder for constructing a [`CronEngine`] with optional features.
pub struct CronEngineBuilder<S: Storage> {
    storage: Arc<S>,
    state: Arc<dyn StateManager>,
    config: CronConfig,
    stats: Arc<dyn StatsSink>,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl<S: Storage> CronEngineBuilder<S> {
    fn new(storage: Arc<S>, state: Arc<dyn StateManager>) -> Self {
        Self {
            storage,
            state,
            config: CronConfig::default(),
            stats: Arc::new(AtomicStats::new()),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: CronConfig) -> Self {
        self.config = config;
        self
    }

    /// Injects a metrics sink (defaults to a fresh [`AtomicStats`]).
    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    /// Attaches event subscribers.
    ///
    /// Subscribers are driven by one listener task spawned at build time, so
    /// `build` must run inside a Tokio runtime when any are attached.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscriber>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the engine and, if subscribers were attached, spawns their
    /// listener task.
    pub fn build(self) -> CronEngine<S> {
        let bus = Bus::new(self.config.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            spawn_listener(&bus, self.subscribers);
        }

        CronEngine {
            resolver: CollisionResolver::new(
                self.storage.clone(),
                self.stats.clone(),
                bus.clone(),
            ),
            launcher: DelayedLauncher::new(
                self.storage,
                self.state,
                self.config.backoff,
                self.config.poll_limit(),
                bus.clone(),
            ),
            bus,
            locks: KeyLocks::new(),
        }
    }
}

/// Forwards bus events to the attached subscribers, in order, until the bus
/// closes.
fn spawn_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscriber>>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    for sub in &subscribers {
                        sub.handle(&ev).await;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::events::EventKind;
    use crate::jobs::{JobConfig, Resources, TaskConfig};
    use crate::policies::{BackoffPolicy, CollisionPolicy, JitterPolicy};
    use crate::store::{
        MemStateManager, MemStorage, ScheduledTask, TaskId, TaskStatus,
    };

    fn key(name: &str) -> JobKey {
        JobKey::new("role", "env", name).unwrap()
    }

    fn task_config() -> TaskConfig {
        TaskConfig {
            command: "run".to_string(),
            resources: Resources {
                cpus: 1.0,
                ram_mb: 64,
                disk_mb: 64,
            },
        }
    }

    fn job_config(name: &str, policy: CollisionPolicy) -> JobConfig {
        JobConfig {
            key: key(name),
            schedule: "0 * * * *".to_string(),
            collision_policy: policy,
            instance_count: 2,
            task: task_config(),
        }
    }

    fn fast_config() -> CronConfig {
        CronConfig {
            backoff: BackoffPolicy {
                first: Duration::from_millis(1),
                max: Duration::from_millis(2),
                factor: 1.0,
                jitter: JitterPolicy::None,
            },
            ..CronConfig::default()
        }
    }

    fn engine(
        storage: &Arc<MemStorage>,
    ) -> (
        CronEngine<MemStorage>,
        Arc<MemStateManager>,
        Arc<crate::stats::AtomicStats>,
    ) {
        let state = Arc::new(MemStateManager::new(storage.clone()));
        let stats = Arc::new(crate::stats::AtomicStats::new());
        let engine = CronEngine::builder(storage.clone(), state.clone())
            .with_config(fast_config())
            .with_stats(stats.clone())
            .build();
        (engine, state, stats)
    }

    #[tokio::test]
    async fn kill_existing_end_to_end() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("myjob", CollisionPolicy::KillExisting))
            .unwrap();
        storage
            .seed_task(ScheduledTask {
                id: TaskId::from("task-123"),
                key: key("myjob"),
                instance: 0,
                status: TaskStatus::Running,
                config: task_config(),
            })
            .unwrap();
        let (engine, state, stats) = engine(&storage);

        // Host side of the kill: once the transition request lands, the
        // task eventually terminates.
        let completer = storage.clone();
        tokio::spawn(async move {
            let id = TaskId::from("task-123");
            loop {
                if completer.task(&id).unwrap().map(|t| t.status) == Some(TaskStatus::Killing) {
                    completer.set_status(&id, TaskStatus::Killed).unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        });

        let token = CancellationToken::new();
        let outcome = engine.trigger(&key("myjob"), &token).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::LaunchedAfterKill);

        let requests = state.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].task_id, TaskId::from("task-123"));
        assert_eq!(requests[0].audit.as_deref(), Some("Killed by cronScheduler"));

        let pending: Vec<_> = storage
            .tasks_for_job(&key("myjob"))
            .unwrap()
            .into_iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 2);
        assert_eq!(
            pending.iter().map(|t| t.instance).collect::<Vec<_>>(),
            vec![0, 1]
        );

        assert_eq!(stats.triggers(), 1);
        assert_eq!(stats.collisions(), 1);
        assert_eq!(stats.misfires(), 0);
    }

    #[tokio::test]
    async fn misfire_makes_no_requests() {
        let storage = Arc::new(MemStorage::new());
        let (engine, state, stats) = engine(&storage);

        let token = CancellationToken::new();
        let outcome = engine.trigger(&key("other"), &token).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Skipped);

        assert_eq!(stats.misfires(), 1);
        assert_eq!(storage.task_count().unwrap(), 0);
        assert!(state.requests().is_empty());
    }

    #[tokio::test]
    async fn immediate_launch_issues_no_kills() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("fresh", CollisionPolicy::KillExisting))
            .unwrap();
        let (engine, state, _stats) = engine(&storage);

        let token = CancellationToken::new();
        let outcome = engine.trigger(&key("fresh"), &token).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Launched);
        assert_eq!(storage.task_count().unwrap(), 2);
        assert!(state.requests().is_empty());
    }

    #[tokio::test]
    async fn cancel_new_skips_and_preserves_the_active_run() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("busy", CollisionPolicy::CancelNew))
            .unwrap();
        storage
            .seed_task(ScheduledTask {
                id: TaskId::from("task-9"),
                key: key("busy"),
                instance: 0,
                status: TaskStatus::Running,
                config: task_config(),
            })
            .unwrap();
        let (engine, state, stats) = engine(&storage);

        let token = CancellationToken::new();
        let outcome = engine.trigger(&key("busy"), &token).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Skipped);
        assert_eq!(stats.collisions(), 1);
        assert!(state.requests().is_empty());
        assert_eq!(
            storage.task(&TaskId::from("task-9")).unwrap().unwrap().status,
            TaskStatus::Running
        );
    }

    #[tokio::test]
    async fn trigger_publishes_lifecycle_events() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("fresh", CollisionPolicy::KillExisting))
            .unwrap();
        let (engine, _state, _stats) = engine(&storage);

        let mut rx = engine.bus().subscribe();
        let token = CancellationToken::new();
        engine.trigger(&key("fresh"), &token).await.unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.kind, EventKind::TriggerFired);
        assert_eq!(first.job.as_deref(), Some("role/env/fresh"));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.kind, EventKind::TasksLaunched);
        assert_eq!(second.count, Some(2));
    }

    #[tokio::test]
    async fn same_key_invocations_serialize() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("serial", CollisionPolicy::CancelNew))
            .unwrap();
        let state = Arc::new(MemStateManager::new(storage.clone()));
        let engine = Arc::new(
            CronEngine::builder(storage.clone(), state)
                .with_config(fast_config())
                .build(),
        );

        let token = CancellationToken::new();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = engine.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                engine.trigger(&key("serial"), &token).await.unwrap()
            }));
        }

        let mut launched = 0;
        for handle in handles {
            if handle.await.unwrap() == TriggerOutcome::Launched {
                launched += 1;
            }
        }

        // Exactly one invocation wins the empty-active branch; the rest
        // observe the collision and skip. Never a duplicate insert.
        assert_eq!(launched, 1);
        assert_eq!(storage.task_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn pre_cancelled_invocation_short_circuits() {
        let storage = Arc::new(MemStorage::new());
        storage
            .insert_job(job_config("fresh", CollisionPolicy::KillExisting))
            .unwrap();
        let (engine, _state, stats) = engine(&storage);

        let token = CancellationToken::new();
        token.cancel();
        let err = engine.trigger(&key("fresh"), &token).await.unwrap_err();
        assert!(matches!(err, CronError::Interrupted { .. }));
        assert_eq!(storage.task_count().unwrap(), 0);
        assert_eq!(stats.triggers(), 0);
    }
}
