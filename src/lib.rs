//! # cronvisor
//!
//! **Cronvisor** is the decision-and-launch engine behind a cluster job
//! scheduler's cron subsystem.
//!
//! When a recurring job's trigger fires, the engine decides — atomically,
//! against live cluster state — whether to launch the job's configured task
//! instances, and how to handle a previous run of the same job that is still
//! active. The crate owns exactly that: the collision-resolution transaction
//! and the kill-then-wait supervisor enforcing at-most-one-active-run
//! semantics per job key. Everything else (schedule parsing, the real
//! storage backend, task teardown, placement) stays behind injected seams.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ trigger fire │   │ trigger fire │   │ trigger fire │
//!     │  (job key A) │   │  (job key B) │   │  (job key A) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  CronEngine                                                       │
//! │  - KeyLocks (same-key firings serialize; B never waits on A)      │
//! │  - CollisionResolver (atomic decision transaction)                │
//! │  - DelayedLauncher (kill → poll → launch)                         │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬──────────────────┬─────────────────────────┬───────────────┘
//!        ▼                  ▼                         ▼
//!   Storage            StateManager              StatsSink
//!   (fetch job,        (request Killing           (triggers, misfires,
//!    fetch/insert       transitions)               parse failures,
//!    tasks)                                        collisions)
//! ```
//!
//! ### One firing
//! ```text
//! CronEngine::trigger(key, token)
//!
//! Storage::write — one atomic unit:
//!   ├─► fetch_job(key)             ── absent  ──► NoOp   (misfire)
//!   ├─► sanitize                   ── invalid ──► NoOp   (parse failure)
//!   ├─► fetch active task ids
//!   ├─► empty?  ──► insert pending tasks        ──► Launched
//!   └─► active? ──► collision branch per policy
//!         ├─ KillExisting ──► Deferred(pending, active)
//!         ├─ RunOverlap   ──► NoOp  (deprecated, logged)
//!         ├─ CancelNew    ──► NoOp
//!         └─ Unknown      ──► NoOp  (defensive, logged)
//!
//! On Deferred:
//!   ├─► change_state(id, Killing, "Killed by cronScheduler")  per id
//!   ├─► retry_until: active ids drained?   (backoff-paced, cancellable)
//!   │     ├─ drained   ──► insert pending tasks ──► LaunchedAfterKill
//!   │     ├─ cancelled ──► Err(Interrupted)      (retryable, no insert)
//!   │     └─ exhausted ──► Err(WaitExhausted)    (retryable, no insert)
//! ```
//!
//! ## Features
//! | Area              | Description                                                          | Key types / traits                        |
//! |-------------------|----------------------------------------------------------------------|-------------------------------------------|
//! | **Engine**        | Evaluate firings, resolve collisions, run deferred launches.         | [`CronEngine`], [`TriggerOutcome`]        |
//! | **Policies**      | Collision behavior and poll backoff.                                 | [`CollisionPolicy`], [`BackoffPolicy`]    |
//! | **Storage seam**  | Transactional executor over job/task stores.                         | [`Storage`], [`StoreReader`], [`StoreWriter`] |
//! | **State seam**    | Fire-and-forget task state transitions.                              | [`StateManager`]                          |
//! | **Observability** | Injected counters plus broadcast lifecycle events.                   | [`StatsSink`], [`Bus`], [`Subscriber`]    |
//! | **Reference impl**| In-memory store/state-manager pair, also the test harness.           | [`MemStorage`], [`MemStateManager`]       |
//! | **Errors**        | Typed, retryable-aware failures.                                     | [`CronError`]                             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use cronvisor::{
//!     CollisionPolicy, CronEngine, JobConfig, JobKey, MemStateManager, MemStorage,
//!     Resources, TaskConfig, TriggerOutcome,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(MemStorage::new());
//!     let state = Arc::new(MemStateManager::new(storage.clone()));
//!
//!     let key = JobKey::new("ads", "prod", "hourly-rollup")?;
//!     storage.insert_job(JobConfig {
//!         key: key.clone(),
//!         schedule: "0 * * * *".to_string(),
//!         collision_policy: CollisionPolicy::KillExisting,
//!         instance_count: 2,
//!         task: TaskConfig {
//!             command: "rollup --hourly".to_string(),
//!             resources: Resources { cpus: 0.5, ram_mb: 256, disk_mb: 1024 },
//!         },
//!     })?;
//!
//!     let engine = CronEngine::builder(storage, state).build();
//!
//!     // The host's cron mechanism calls this on every firing.
//!     let outcome = engine.trigger(&key, &CancellationToken::new()).await?;
//!     assert_eq!(outcome, TriggerOutcome::Launched);
//!     Ok(())
//! }
//! ```

mod config;
mod cron;
mod error;
mod events;
mod jobs;
mod keys;
mod policies;
mod retry;
mod state;
mod stats;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::CronConfig;
pub use cron::{CronEngine, CronEngineBuilder, Decision, DeferredLaunch, KILL_AUDIT_MESSAGE, TriggerOutcome};
pub use error::{CronError, InvalidJob, KeyError, RetryError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{JobConfig, MAX_TASK_INSTANCES, PendingTaskSet, Resources, SanitizedCronJob, TaskConfig};
pub use keys::{JobKey, MAX_IDENTIFIER_LEN};
pub use policies::{BackoffPolicy, CollisionPolicy, JitterPolicy};
pub use retry::retry_until;
pub use state::StateManager;
pub use stats::{AtomicStats, Counter, StatsSink};
pub use store::{
    ActiveTaskIdSet, MemStateManager, MemStorage, ScheduledTask, StateChange, Storage,
    StoreReader, StoreWriter, TaskId, TaskQuery, TaskStatus,
};
pub use subscribers::Subscriber;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
