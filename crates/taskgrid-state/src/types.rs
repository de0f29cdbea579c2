//! Domain types for the TaskGrid registry.
//!
//! Identifiers and weights are the raw integers handed in by the host, so
//! non-positive values stay representable and can be rejected with a
//! proper error instead of failing to parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a worker node. Valid ids are strictly positive.
pub type NodeId = i32;

/// Identifier of a task. Valid ids are strictly positive.
pub type TaskId = i32;

/// Resource consumption rate of a task. Valid weights are strictly positive.
pub type Weight = i32;

/// Maximum tolerated load difference between any two nodes.
pub type Threshold = i32;

/// Aggregate load of a node (sum of the weights placed on it).
pub type Load = i64;

/// Node id reported for a task that is still pending.
pub const UNASSIGNED_NODE: NodeId = -1;

/// Committed placements: node id → task ids in placement order.
pub type Assignments = BTreeMap<NodeId, Vec<TaskId>>;

/// One record of the task status report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskInfo {
    pub task_id: TaskId,
    pub node_id: NodeId,
}

impl TaskInfo {
    pub fn new(task_id: TaskId, node_id: NodeId) -> Self {
        Self { task_id, node_id }
    }

    /// Whether the task is still waiting in the pending queue.
    pub fn is_pending(&self) -> bool {
        self.node_id == UNASSIGNED_NODE
    }
}

/// A task waiting in the pending queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTask {
    pub id: TaskId,
    pub weight: Weight,
    /// Insertion sequence from the first time the task was added.
    /// Breaks ties between equal weights.
    pub seq: u64,
}

impl PendingTask {
    /// Queue ordering key: heavier first, then older first.
    pub fn queue_key(&self) -> (std::cmp::Reverse<Weight>, u64) {
        (std::cmp::Reverse(self.weight), self.seq)
    }
}

/// Bookkeeping for every task the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TaskRecord {
    pub weight: Weight,
    pub seq: u64,
    /// Node currently holding the task, `None` while pending.
    pub node: Option<NodeId>,
}
