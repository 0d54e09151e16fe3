//! # Job configurations and their sanitization gate.
//!
//! This module provides the stored job model:
//! - [`JobConfig`] - the raw configuration as fetched from the job store
//! - [`TaskConfig`] - the immutable per-instance task template
//! - [`Resources`] - the task's resource footprint
//! - [`SanitizedCronJob`] - a validated configuration ready to derive task
//!   instances from
//!
//! Raw configurations are never launched directly: every trigger passes the
//! fetched config through [`SanitizedCronJob::from_unsanitized`] first, and a
//! rejection degrades the firing to a no-op.

mod config;
mod sanitize;

pub use config::{JobConfig, Resources, TaskConfig};
pub use sanitize::{MAX_TASK_INSTANCES, PendingTaskSet, SanitizedCronJob};
