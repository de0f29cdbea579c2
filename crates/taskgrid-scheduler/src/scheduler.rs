//! Scheduler: greedy, threshold-checked placement of pending tasks.
//!
//! The `TaskScheduler` owns the registry and drives a scheduling run:
//! - Takes the pending queue heaviest-first
//! - Places each task on the least-loaded node (smallest id on ties)
//! - Re-checks balance after every placement and bails on the first
//!   violation
//! - Commits the run only when every pending task was placed

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tracing::{debug, info, warn};

use taskgrid_state::*;

use crate::balance::{Balance, LoadTable};
use crate::error::{Infeasibility, SchedulerError, SchedulerResult};
use crate::report::{StatusReport, collect_status};

/// A complete placement computed by a scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulePlan {
    pub threshold: Threshold,
    /// Placements made by this run, in placement order.
    pub placements: Vec<TaskInfo>,
    /// Final load per registered node.
    pub loads: BTreeMap<NodeId, Load>,
    /// Difference between the heaviest and the lightest node.
    pub spread: Load,
    #[serde(skip)]
    assignments: Assignments,
}

impl SchedulePlan {
    /// Full assignment map the plan would commit.
    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }
}

/// Task scheduler over an owned [`TaskStore`].
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    store: TaskStore,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the registry.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Clear all nodes, tasks and assignments.
    pub fn init(&mut self) {
        self.store.reset();
    }

    pub fn register_node(&mut self, node_id: NodeId) -> SchedulerResult<()> {
        self.store.register_node(node_id)?;
        Ok(())
    }

    /// Unregister a node; its tasks return to the pending queue.
    pub fn unregister_node(&mut self, node_id: NodeId) -> SchedulerResult<Vec<TaskId>> {
        let released = self.store.unregister_node(node_id)?;
        if !released.is_empty() {
            info!(node_id, tasks = ?released, "tasks returned to pending queue");
        }
        Ok(released)
    }

    pub fn add_task(&mut self, task_id: TaskId, weight: Weight) -> SchedulerResult<()> {
        self.store.add_task(task_id, weight)?;
        Ok(())
    }

    /// Delete a pending or assigned task.
    pub fn delete_task(&mut self, task_id: TaskId) -> SchedulerResult<Option<NodeId>> {
        Ok(self.store.delete_task(task_id)?)
    }

    /// Schedule every pending task and commit the result.
    ///
    /// On failure nothing but the recorded threshold changes: committed
    /// assignments and the pending queue stay exactly as they were.
    pub fn schedule_tasks(&mut self, threshold: Threshold) -> SchedulerResult<SchedulePlan> {
        if !self.store.has_pending() {
            return Err(SchedulerError::NoPendingTasks);
        }
        if threshold <= 0 {
            return Err(SchedulerError::InvalidThreshold(threshold));
        }
        self.store.set_threshold(threshold);

        let plan = match self.plan(threshold) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(threshold, error = %e, "scheduling run rejected");
                return Err(e);
            }
        };

        self.store.commit(plan.assignments.clone())?;
        info!(
            threshold,
            placed = plan.placements.len(),
            spread = plan.spread,
            "schedule committed"
        );
        Ok(plan)
    }

    /// Compute the placement `schedule_tasks` would commit, without
    /// committing it.
    ///
    /// Committed assignments are kept in place; only pending tasks move.
    /// An empty pending queue is reported before an invalid threshold.
    pub fn plan(&self, threshold: Threshold) -> SchedulerResult<SchedulePlan> {
        if !self.store.has_pending() {
            return Err(SchedulerError::NoPendingTasks);
        }
        if threshold <= 0 {
            return Err(SchedulerError::InvalidThreshold(threshold));
        }

        let mut assignments = self.store.assignments().clone();
        let mut loads = LoadTable::from_store(&self.store);
        let mut queue: VecDeque<PendingTask> = self.store.pending().iter().copied().collect();
        let mut placements = Vec::with_capacity(queue.len());

        while let Some(task) = queue.pop_front() {
            let node_id = loads
                .least_loaded()
                .ok_or(SchedulerError::NoSuitableSchedule(Infeasibility::NoNodes {
                    task_id: task.id,
                }))?;

            assignments.entry(node_id).or_default().push(task.id);
            loads.add(node_id, task.weight);
            placements.push(TaskInfo::new(task.id, node_id));
            debug!(
                task_id = task.id,
                weight = task.weight,
                node_id,
                load = loads.get(node_id).unwrap_or(0),
                "task placed"
            );

            if let Balance::Unbalanced {
                heaviest,
                lightest,
                spread,
            } = loads.evaluate(threshold)
            {
                return Err(SchedulerError::NoSuitableSchedule(
                    Infeasibility::Unbalanced {
                        task_id: task.id,
                        node_id,
                        heaviest,
                        lightest,
                        spread,
                        threshold,
                    },
                ));
            }
        }

        let spread = loads.spread();
        Ok(SchedulePlan {
            threshold,
            placements,
            loads: loads.into_inner(),
            spread,
            assignments,
        })
    }

    /// Fill `out` with the status of every task, ascending by task id.
    ///
    /// `out` must be empty; a non-empty vector is rejected untouched.
    pub fn query_task_status(&self, out: &mut Vec<TaskInfo>) -> SchedulerResult<()> {
        if !out.is_empty() {
            return Err(SchedulerError::InvalidArgument(format!(
                "output list must be empty, found {} records",
                out.len()
            )));
        }
        out.extend(collect_status(&self.store));
        Ok(())
    }

    /// Status of every task, ascending by task id.
    pub fn task_status(&self) -> Vec<TaskInfo> {
        collect_status(&self.store)
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport::from_store(&self.store)
    }
}
