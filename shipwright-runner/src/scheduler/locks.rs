//! Per-task execution locks
//!
//! Two rounds of the same task must never deploy at the same time. Each
//! task id maps to an async mutex; a job holds it from admission until its
//! deployment finishes. Entries are removed once nobody holds or waits on
//! them, so the registry only grows with the number of busy tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::AdmissionTimeoutError;

type Slot = Arc<AsyncMutex<()>>;

/// Registry of per-task locks, cheap to clone
#[derive(Clone, Default)]
pub struct TaskLockRegistry {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl TaskLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for exclusive use of `task_id`
    pub async fn acquire(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> Result<TaskGuard, AdmissionTimeoutError> {
        let slot = Arc::clone(
            self.slots()
                .entry(task_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        );

        let acquired = tokio::time::timeout(timeout, Arc::clone(&slot).lock_owned()).await;
        match acquired {
            Ok(guard) => {
                debug!(task = task_id, "Task lock acquired");
                Ok(TaskGuard {
                    registry: self.clone(),
                    task_id: task_id.to_string(),
                    guard: Some(guard),
                })
            }
            Err(_) => {
                drop(slot);
                self.prune(task_id);
                Err(AdmissionTimeoutError {
                    task_id: task_id.to_string(),
                    waited: timeout,
                })
            }
        }
    }

    /// Number of tasks currently held or waited on
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the entry for `task_id` if the registry holds the only reference
    fn prune(&self, task_id: &str) {
        let mut slots = self.slots();
        let unused = slots
            .get(task_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if unused {
            slots.remove(task_id);
        }
    }
}

/// Exclusive hold on one task; released on drop
pub struct TaskGuard {
    registry: TaskLockRegistry,
    task_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TaskGuard {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        // The guard owns a reference to the slot; release it before pruning.
        self.guard.take();
        self.registry.prune(&self.task_id);
        debug!(task = %self.task_id, "Task lock released");
    }
}
