//! Trigger engine: collision decision and delayed launch.
//!
//! This module contains the heart of the crate. One firing of a recurring
//! job flows through:
//!
//! ```text
//! CronEngine::trigger(key, token)
//!   └─► acquire per-key lock (same-key firings serialize)
//!   └─► CollisionResolver::evaluate(key)          — one atomic transaction
//!         ├─ no config          → NoOp            (misfire)
//!         ├─ invalid config     → NoOp            (parse failure)
//!         ├─ no active tasks    → insert pending  → Launched
//!         └─ active tasks       → collision branch per policy
//!              ├─ KillExisting  → Deferred(pending, active)
//!              ├─ RunOverlap    → NoOp            (deprecated)
//!              ├─ CancelNew     → NoOp
//!              └─ Unknown       → NoOp
//!   └─► on Deferred: DelayedLauncher::run(key, deferred, token)
//!         ├─ request kill for every active id
//!         ├─ poll (backoff-paced, cancellable) until the ids drain
//!         └─ insert pending    → LaunchedAfterKill
//! ```
//!
//! Internal modules:
//! - [`decision`]: the atomic fetch → sanitize → inspect → decide transaction;
//! - [`launch`]: the kill-then-wait supervisor for deferred launches;
//! - [`trigger`]: the engine entry point, builder, and per-key locking.

mod decision;
mod launch;
mod trigger;

pub use decision::Decision;
pub use launch::{DeferredLaunch, KILL_AUDIT_MESSAGE};
pub use trigger::{CronEngine, CronEngineBuilder, TriggerOutcome};
