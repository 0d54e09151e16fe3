//! # In-memory reference implementation of the storage seam.
//!
//! [`MemStorage`] keeps jobs and tasks in maps behind one `RwLock`. The lock
//! is held for the duration of a `write` closure, which gives full
//! serializability — stronger than the per-key isolation the [`Storage`]
//! contract requires, and plenty for an embedded store. Transactions here
//! are synchronous, bounded operations.
//!
//! [`MemStateManager`] pairs with it: it records every state-transition
//! request and applies the status change to the store without waiting for
//! anything to actually terminate. Moving a task *out* of the active set
//! (e.g. `Killing` → `Killed`) is the host's business — in tests, the
//! harness's — which is exactly what lets the delayed-launch poll loop be
//! exercised for real.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::StoreError;
use crate::jobs::{JobConfig, PendingTaskSet, TaskConfig};
use crate::keys::JobKey;
use crate::state::StateManager;
use crate::store::query::TaskQuery;
use crate::store::status::TaskStatus;
use crate::store::{ActiveTaskIdSet, Storage, StoreReader, StoreWriter, TaskId};

/// One scheduled task instance as recorded in the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    /// Unique task id.
    pub id: TaskId,
    /// Owning job.
    pub key: JobKey,
    /// Instance id within the job.
    pub instance: u32,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// The template the instance was launched from.
    pub config: TaskConfig,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobKey, JobConfig>,
    tasks: BTreeMap<TaskId, ScheduledTask>,
    task_seq: u64,
}

impl StoreReader for Inner {
    fn fetch_job(&self, key: &JobKey) -> Option<JobConfig> {
        self.jobs.get(key).cloned()
    }

    fn fetch_task_ids(&self, query: &TaskQuery) -> ActiveTaskIdSet {
        self.tasks
            .values()
            .filter(|t| query.matches(&t.id, &t.key, t.status))
            .map(|t| t.id.clone())
            .collect()
    }
}

impl StoreWriter for Inner {
    fn insert_pending_tasks(
        &mut self,
        key: &JobKey,
        pending: &PendingTaskSet,
    ) -> Result<(), StoreError> {
        for (&instance, config) in pending {
            self.task_seq += 1;
            let id = TaskId::from(format!("{key}-{instance}-{}", self.task_seq));
            self.tasks.insert(
                id.clone(),
                ScheduledTask {
                    id,
                    key: key.clone(),
                    instance,
                    status: TaskStatus::Pending,
                    config: config.clone(),
                },
            );
        }
        Ok(())
    }
}

/// In-memory job and task store with a transactional surface.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

impl MemStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a job configuration.
    pub fn insert_job(&self, config: JobConfig) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.jobs.insert(config.key.clone(), config);
        Ok(())
    }

    /// Removes a job configuration. Scheduled tasks are left untouched.
    pub fn remove_job(&self, key: &JobKey) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.jobs.remove(key);
        Ok(())
    }

    /// Looks up one task by id.
    pub fn task(&self, id: &TaskId) -> Result<Option<ScheduledTask>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.tasks.get(id).cloned())
    }

    /// All tasks belonging to `key`, in id order.
    pub fn tasks_for_job(&self, key: &JobKey) -> Result<Vec<ScheduledTask>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .tasks
            .values()
            .filter(|t| &t.key == key)
            .cloned()
            .collect())
    }

    /// Sets the status of one task. No-op when the id is unknown.
    pub fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(task) = inner.tasks.get_mut(id) {
            task.status = status;
        }
        Ok(())
    }

    /// Removes one task record entirely.
    pub fn remove_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.tasks.remove(id);
        Ok(())
    }

    /// Pre-seeds a task record, bypassing the pending-insert path.
    ///
    /// Useful for hosts importing existing cluster state and for tests that
    /// need a specific id or status in place.
    pub fn seed_task(&self, task: ScheduledTask) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Total number of task records (any status).
    pub fn task_count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.tasks.len())
    }
}

impl Storage for MemStorage {
    fn write<T, F>(&self, _key: &JobKey, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn StoreWriter) -> T,
    {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(work(&mut *inner))
    }

    fn read<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn StoreReader) -> T,
    {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(work(&*inner))
    }
}

/// One recorded state-transition request.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    /// Task the transition was requested for.
    pub task_id: TaskId,
    /// Expected current status, `None` for unconditional requests.
    pub from: Option<TaskStatus>,
    /// Requested target status.
    pub to: TaskStatus,
    /// Audit annotation attached to the request.
    pub audit: Option<String>,
}

/// State manager over a [`MemStorage`].
///
/// Records every request and applies the status change immediately when the
/// task exists, is still active, and matches the expected `from` status.
/// The request itself never blocks on the transition completing.
pub struct MemStateManager {
    storage: Arc<MemStorage>,
    log: Mutex<Vec<StateChange>>,
}

impl MemStateManager {
    /// Creates a state manager applying transitions to `storage`.
    pub fn new(storage: Arc<MemStorage>) -> Self {
        Self {
            storage,
            log: Mutex::new(Vec::new()),
        }
    }

    /// All transition requests observed so far, in order.
    pub fn requests(&self) -> Vec<StateChange> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl StateManager for MemStateManager {
    fn change_state(
        &self,
        task_id: &TaskId,
        from: Option<TaskStatus>,
        to: TaskStatus,
        audit: Option<&str>,
    ) {
        if let Ok(mut log) = self.log.lock() {
            log.push(StateChange {
                task_id: task_id.clone(),
                from,
                to,
                audit: audit.map(str::to_string),
            });
        }

        if let Ok(mut inner) = self.storage.inner.write() {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                let matches_from = from.is_none_or(|expected| expected == task.status);
                if matches_from && task.status.is_active() {
                    task.status = to;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Resources;
    use crate::policies::CollisionPolicy;

    fn key() -> JobKey {
        JobKey::new("role", "env", "job").unwrap()
    }

    fn task_config() -> TaskConfig {
        TaskConfig {
            command: "work".to_string(),
            resources: Resources {
                cpus: 1.0,
                ram_mb: 64,
                disk_mb: 64,
            },
        }
    }

    fn job_config() -> JobConfig {
        JobConfig {
            key: key(),
            schedule: "* * * * *".to_string(),
            collision_policy: CollisionPolicy::KillExisting,
            instance_count: 2,
            task: task_config(),
        }
    }

    fn pending(instances: &[u32]) -> PendingTaskSet {
        instances.iter().map(|&i| (i, task_config())).collect()
    }

    #[test]
    fn fetch_job_round_trip() {
        let storage = MemStorage::new();
        storage.insert_job(job_config()).unwrap();

        let fetched = storage.read(|s| s.fetch_job(&key())).unwrap();
        assert_eq!(fetched, Some(job_config()));

        storage.remove_job(&key()).unwrap();
        assert!(storage.read(|s| s.fetch_job(&key())).unwrap().is_none());
    }

    #[test]
    fn insert_pending_creates_pending_records() {
        let storage = MemStorage::new();
        storage
            .write(&key(), |s| s.insert_pending_tasks(&key(), &pending(&[0, 1])))
            .unwrap()
            .unwrap();

        let tasks = storage.tasks_for_job(&key()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
        let instances: Vec<u32> = tasks.iter().map(|t| t.instance).collect();
        assert_eq!(instances, vec![0, 1]);
    }

    #[test]
    fn active_query_excludes_terminal_tasks() {
        let storage = MemStorage::new();
        storage
            .write(&key(), |s| s.insert_pending_tasks(&key(), &pending(&[0, 1])))
            .unwrap()
            .unwrap();

        let ids = storage
            .read(|s| s.fetch_task_ids(&TaskQuery::job_scoped(key()).active()))
            .unwrap();
        assert_eq!(ids.len(), 2);

        let first = ids.iter().next().unwrap().clone();
        storage.set_status(&first, TaskStatus::Finished).unwrap();

        let ids = storage
            .read(|s| s.fetch_task_ids(&TaskQuery::job_scoped(key()).active()))
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert!(!ids.contains(&first));
    }

    #[test]
    fn state_manager_records_and_applies_transitions() {
        let storage = Arc::new(MemStorage::new());
        storage
            .write(&key(), |s| s.insert_pending_tasks(&key(), &pending(&[0])))
            .unwrap()
            .unwrap();
        let id = storage.tasks_for_job(&key()).unwrap()[0].id.clone();

        let manager = MemStateManager::new(storage.clone());
        manager.change_state(&id, None, TaskStatus::Killing, Some("audit"));

        let requests = manager.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].task_id, id);
        assert_eq!(requests[0].to, TaskStatus::Killing);
        assert_eq!(requests[0].audit.as_deref(), Some("audit"));

        assert_eq!(storage.task(&id).unwrap().unwrap().status, TaskStatus::Killing);
    }

    #[test]
    fn state_manager_ignores_mismatched_from_status() {
        let storage = Arc::new(MemStorage::new());
        storage
            .write(&key(), |s| s.insert_pending_tasks(&key(), &pending(&[0])))
            .unwrap()
            .unwrap();
        let id = storage.tasks_for_job(&key()).unwrap()[0].id.clone();

        let manager = MemStateManager::new(storage.clone());
        manager.change_state(&id, Some(TaskStatus::Running), TaskStatus::Killing, None);

        // Request is logged, but the transition does not apply.
        assert_eq!(manager.requests().len(), 1);
        assert_eq!(storage.task(&id).unwrap().unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn terminal_tasks_never_transition() {
        let storage = Arc::new(MemStorage::new());
        storage
            .seed_task(ScheduledTask {
                id: TaskId::from("t-1"),
                key: key(),
                instance: 0,
                status: TaskStatus::Finished,
                config: task_config(),
            })
            .unwrap();

        let manager = MemStateManager::new(storage.clone());
        manager.change_state(&TaskId::from("t-1"), None, TaskStatus::Killing, None);

        let status = storage.task(&TaskId::from("t-1")).unwrap().unwrap().status;
        assert_eq!(status, TaskStatus::Finished);
    }
}
