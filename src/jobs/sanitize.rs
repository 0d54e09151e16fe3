//! # Sanitization of stored job configurations.
//!
//! [`SanitizedCronJob`] is the proof that a stored [`JobConfig`] passed
//! validation: the schedule line is present, the instance count is within
//! bounds, the command is non-empty and the resource dimensions are positive.
//! Only a sanitized job can derive its [`PendingTaskSet`].
//!
//! ## Rules
//! - Sanitization never mutates the underlying configuration.
//! - Instance ids are dense: `0..instance_count`, one entry per id, no
//!   duplicates.

use std::collections::BTreeMap;

use crate::error::InvalidJob;
use crate::jobs::config::{JobConfig, TaskConfig};
use crate::keys::JobKey;
use crate::policies::CollisionPolicy;

/// Maximum number of task instances a single job may configure.
pub const MAX_TASK_INSTANCES: u32 = 4000;

/// Mapping from instance id to its task configuration.
///
/// Keys are exactly the sanitized job's configured instance ids.
pub type PendingTaskSet = BTreeMap<u32, TaskConfig>;

/// A validated job configuration, ready to derive task instances from.
#[derive(Clone, Debug, PartialEq)]
pub struct SanitizedCronJob {
    config: JobConfig,
}

impl SanitizedCronJob {
    /// Validates a raw configuration fetched from the job store.
    ///
    /// ### Checks
    /// - schedule line non-empty (after trimming)
    /// - `1..=MAX_TASK_INSTANCES` task instances
    /// - command line non-empty (after trimming)
    /// - all resource dimensions positive and finite
    pub fn from_unsanitized(config: JobConfig) -> Result<Self, InvalidJob> {
        if config.schedule.trim().is_empty() {
            return Err(InvalidJob::EmptySchedule);
        }
        if config.instance_count == 0 {
            return Err(InvalidJob::NoInstances);
        }
        if config.instance_count > MAX_TASK_INSTANCES {
            return Err(InvalidJob::TooManyInstances {
                requested: config.instance_count,
                limit: MAX_TASK_INSTANCES,
            });
        }
        if config.task.command.trim().is_empty() {
            return Err(InvalidJob::EmptyCommand);
        }
        check_resources(&config)?;

        Ok(Self { config })
    }

    /// The job's identity.
    pub fn key(&self) -> &JobKey {
        &self.config.key
    }

    /// The configured collision policy.
    pub fn collision_policy(&self) -> CollisionPolicy {
        self.config.collision_policy
    }

    /// The opaque schedule line.
    pub fn schedule(&self) -> &str {
        &self.config.schedule
    }

    /// The underlying validated configuration.
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Derives the set of task instances one firing launches.
    ///
    /// One entry per instance id in `0..instance_count`, each carrying a
    /// clone of the validated task template.
    pub fn pending_task_set(&self) -> PendingTaskSet {
        (0..self.config.instance_count)
            .map(|instance| (instance, self.config.task.clone()))
            .collect()
    }
}

fn check_resources(config: &JobConfig) -> Result<(), InvalidJob> {
    let res = &config.task.resources;
    if !(res.cpus.is_finite() && res.cpus > 0.0) {
        return Err(InvalidJob::BadResources {
            detail: format!("cpus must be positive, got {}", res.cpus),
        });
    }
    if res.ram_mb == 0 {
        return Err(InvalidJob::BadResources {
            detail: "ram_mb must be positive, got 0".to_string(),
        });
    }
    if res.disk_mb == 0 {
        return Err(InvalidJob::BadResources {
            detail: "disk_mb must be positive, got 0".to_string(),
        });
    }
    Ok(())
}
