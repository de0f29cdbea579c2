//! Scheduler error types.

use thiserror::Error;

use taskgrid_state::{Load, NodeId, StateError, TaskId, Threshold};

/// Errors that can occur during scheduling operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(Threshold),

    #[error("no pending tasks to schedule")]
    NoPendingTasks,

    #[error("no suitable schedule: {0}")]
    NoSuitableSchedule(Infeasibility),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("registry error: {0}")]
    State(#[from] StateError),
}

/// Why a scheduling run gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Infeasibility {
    #[error("no registered node to place task {task_id} on")]
    NoNodes { task_id: TaskId },

    #[error(
        "placing task {task_id} on node {node_id} leaves nodes {heaviest} and {lightest} \
         {spread} apart (threshold {threshold})"
    )]
    Unbalanced {
        task_id: TaskId,
        node_id: NodeId,
        heaviest: NodeId,
        lightest: NodeId,
        spread: Load,
        threshold: Threshold,
    },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
