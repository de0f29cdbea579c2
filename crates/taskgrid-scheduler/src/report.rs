//! Task status reporting.

use std::fmt;

use serde::{Deserialize, Serialize};
use taskgrid_state::{Load, NodeId, TaskInfo, TaskStore, Threshold, UNASSIGNED_NODE};

use crate::balance::LoadTable;

/// One record per known task, ascending by task id.
///
/// Committed tasks report their node; pending tasks report
/// [`UNASSIGNED_NODE`].
pub fn collect_status(store: &TaskStore) -> Vec<TaskInfo> {
    let mut records: Vec<TaskInfo> = store
        .assignments()
        .iter()
        .flat_map(|(&node_id, tasks)| tasks.iter().map(move |&id| TaskInfo::new(id, node_id)))
        .chain(
            store
                .pending()
                .iter()
                .map(|t| TaskInfo::new(t.id, UNASSIGNED_NODE)),
        )
        .collect();
    records.sort_unstable_by_key(|r| r.task_id);
    records
}

/// Aggregate load of one node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeLoad {
    pub node_id: NodeId,
    pub load: Load,
}

/// Owned snapshot of the scheduler state, for hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub tasks: Vec<TaskInfo>,
    pub nodes: Vec<NodeLoad>,
    pub pending: usize,
    pub threshold: Option<Threshold>,
    /// Difference between the heaviest and the lightest node.
    pub spread: Load,
}

impl StatusReport {
    pub fn from_store(store: &TaskStore) -> Self {
        let loads = LoadTable::from_store(store);
        let nodes: Vec<NodeLoad> = loads
            .iter()
            .map(|(node_id, load)| NodeLoad { node_id, load })
            .collect();

        Self {
            tasks: collect_status(store),
            nodes,
            pending: store.pending().len(),
            threshold: store.threshold(),
            spread: loads.spread(),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tasks:")?;
        if self.tasks.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for task in &self.tasks {
            if task.is_pending() {
                writeln!(f, "  task {:>6} -> pending", task.task_id)?;
            } else {
                writeln!(f, "  task {:>6} -> node {}", task.task_id, task.node_id)?;
            }
        }
        writeln!(f, "nodes:")?;
        if self.nodes.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for node in &self.nodes {
            writeln!(f, "  node {:>6}  load {}", node.node_id, node.load)?;
        }
        match self.threshold {
            Some(t) => write!(
                f,
                "pending: {}  spread: {}  threshold: {}",
                self.pending, self.spread, t
            ),
            None => write!(f, "pending: {}  spread: {}", self.pending, self.spread),
        }
    }
}
