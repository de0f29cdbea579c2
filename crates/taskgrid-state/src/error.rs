//! Error types for the TaskGrid registry.

use thiserror::Error;

use crate::types::{NodeId, TaskId, Weight};

/// Result type alias for registry operations.
pub type StateResult<T> = Result<T, StateError>;

/// Validation and state-conflict errors raised by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid node id: {0}")]
    InvalidNodeId(NodeId),

    #[error("node already registered: {0}")]
    NodeAlreadyRegistered(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("invalid task id: {0}")]
    InvalidTaskId(TaskId),

    #[error("invalid weight {weight} for task {task_id}")]
    InvalidWeight { task_id: TaskId, weight: Weight },

    #[error("task already exists: {0}")]
    TaskAlreadyExists(TaskId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}
