//! Thread-safe scheduler handle.
//!
//! Registry and assignments sit behind a single `Mutex`, so a scheduling
//! run is atomic with respect to registration and deletion. Operations
//! validate before they mutate; a poisoned lock is recovered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskgrid_state::{NodeId, TaskId, TaskInfo, Threshold, Weight};

use crate::error::SchedulerResult;
use crate::report::StatusReport;
use crate::scheduler::{SchedulePlan, TaskScheduler};

/// Cloneable, `Send + Sync` handle to a [`TaskScheduler`].
#[derive(Debug, Clone, Default)]
pub struct SharedScheduler {
    inner: Arc<Mutex<TaskScheduler>>,
}

impl SharedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self) {
        self.lock().init();
    }

    pub fn register_node(&self, node_id: NodeId) -> SchedulerResult<()> {
        self.lock().register_node(node_id)
    }

    pub fn unregister_node(&self, node_id: NodeId) -> SchedulerResult<Vec<TaskId>> {
        self.lock().unregister_node(node_id)
    }

    pub fn add_task(&self, task_id: TaskId, weight: Weight) -> SchedulerResult<()> {
        self.lock().add_task(task_id, weight)
    }

    pub fn delete_task(&self, task_id: TaskId) -> SchedulerResult<Option<NodeId>> {
        self.lock().delete_task(task_id)
    }

    pub fn schedule_tasks(&self, threshold: Threshold) -> SchedulerResult<SchedulePlan> {
        self.lock().schedule_tasks(threshold)
    }

    pub fn query_task_status(&self, out: &mut Vec<TaskInfo>) -> SchedulerResult<()> {
        self.lock().query_task_status(out)
    }

    pub fn task_status(&self) -> Vec<TaskInfo> {
        self.lock().task_status()
    }

    pub fn status_report(&self) -> StatusReport {
        self.lock().status_report()
    }

    /// Run `f` with exclusive access to the scheduler.
    pub fn with<R>(&self, f: impl FnOnce(&mut TaskScheduler) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, TaskScheduler> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
