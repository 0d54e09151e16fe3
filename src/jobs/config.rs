//! # Stored job model.
//!
//! [`JobConfig`] is the shape a recurring job has in the job store: a key, an
//! opaque schedule line, a collision policy, an instance count and one
//! [`TaskConfig`] template shared by all instances. Schedule *parsing* is the
//! host's concern; the engine only checks that the line is present.

use serde::{Deserialize, Serialize};

use crate::keys::JobKey;
use crate::policies::CollisionPolicy;

/// Resource footprint of one task instance.
///
/// All dimensions must be positive for the job to pass sanitization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU cores (fractional allowed).
    pub cpus: f64,
    /// RAM in megabytes.
    pub ram_mb: u64,
    /// Disk in megabytes.
    pub disk_mb: u64,
}

/// Immutable template for one task instance of a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Command line the instance executes.
    pub command: String,
    /// Resources the instance is entitled to.
    pub resources: Resources,
}

/// Raw, unsanitized job configuration as stored in the job store.
///
/// Fetched by key on every trigger firing and validated through
/// [`SanitizedCronJob::from_unsanitized`](crate::SanitizedCronJob::from_unsanitized)
/// before anything is launched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// The job's identity.
    pub key: JobKey,
    /// Opaque cron schedule line (e.g. `0 * * * *`). Parsed elsewhere.
    pub schedule: String,
    /// What to do when a firing collides with an active prior run.
    pub collision_policy: CollisionPolicy,
    /// Number of task instances to launch per firing.
    pub instance_count: u32,
    /// Template shared by all instances.
    pub task: TaskConfig,
}
