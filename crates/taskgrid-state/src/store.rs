//! TaskStore: the registry of nodes and tasks plus committed assignments.
//!
//! Every mutating operation validates its input completely before
//! touching any collection, so a rejected call never leaves partial
//! changes behind.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::error::{StateError, StateResult};
use crate::types::*;

/// In-memory registry of worker nodes, pending tasks and assignments.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    /// Registered nodes, iterated in ascending id order.
    nodes: BTreeSet<NodeId>,
    /// Pending queue: descending weight, ties by insertion order.
    pending: Vec<PendingTask>,
    /// Every known task, pending or assigned.
    tasks: HashMap<TaskId, TaskRecord>,
    /// Committed placements, one entry per registered node.
    assignments: Assignments,
    /// Threshold of the most recent scheduling call.
    threshold: Option<Threshold>,
    next_seq: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node, task and assignment.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.pending.clear();
        self.tasks.clear();
        self.assignments.clear();
        self.threshold = None;
        self.next_seq = 0;
        info!("task store reset");
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Register a worker node.
    pub fn register_node(&mut self, node_id: NodeId) -> StateResult<()> {
        if node_id <= 0 {
            return Err(StateError::InvalidNodeId(node_id));
        }
        if !self.nodes.insert(node_id) {
            return Err(StateError::NodeAlreadyRegistered(node_id));
        }
        self.assignments.insert(node_id, Vec::new());
        debug!(node_id, "node registered");
        Ok(())
    }

    /// Remove a worker node.
    ///
    /// Tasks assigned to the node go back to the pending queue with their
    /// original insertion sequence. Returns the ids of those tasks in the
    /// order they had been placed on the node.
    pub fn unregister_node(&mut self, node_id: NodeId) -> StateResult<Vec<TaskId>> {
        if node_id <= 0 {
            return Err(StateError::InvalidNodeId(node_id));
        }
        if !self.nodes.remove(&node_id) {
            return Err(StateError::NodeNotFound(node_id));
        }

        let released = self.assignments.remove(&node_id).unwrap_or_default();
        for &task_id in &released {
            self.release(task_id);
        }

        debug!(node_id, released = released.len(), "node unregistered");
        Ok(released)
    }

    /// Whether the node is currently registered.
    pub fn is_registered(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Registered node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ── Tasks ──────────────────────────────────────────────────────

    /// Add a task to the pending queue.
    ///
    /// The id must be unknown to the store, whether pending or assigned.
    pub fn add_task(&mut self, task_id: TaskId, weight: Weight) -> StateResult<()> {
        if task_id <= 0 {
            return Err(StateError::InvalidTaskId(task_id));
        }
        if weight <= 0 {
            return Err(StateError::InvalidWeight { task_id, weight });
        }
        if self.tasks.contains_key(&task_id) {
            return Err(StateError::TaskAlreadyExists(task_id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(
            task_id,
            TaskRecord {
                weight,
                seq,
                node: None,
            },
        );
        self.enqueue(PendingTask {
            id: task_id,
            weight,
            seq,
        });

        debug!(task_id, weight, "task added");
        Ok(())
    }

    /// Delete a task, pending or assigned.
    ///
    /// Returns the node the task was assigned to, if any.
    pub fn delete_task(&mut self, task_id: TaskId) -> StateResult<Option<NodeId>> {
        if task_id <= 0 {
            return Err(StateError::InvalidTaskId(task_id));
        }
        let record = self
            .tasks
            .remove(&task_id)
            .ok_or(StateError::TaskNotFound(task_id))?;

        match record.node {
            Some(node_id) => {
                if let Some(placed) = self.assignments.get_mut(&node_id) {
                    placed.retain(|&id| id != task_id);
                }
            }
            None => self.pending.retain(|t| t.id != task_id),
        }

        debug!(task_id, node = ?record.node, "task deleted");
        Ok(record.node)
    }

    pub fn weight_of(&self, task_id: TaskId) -> Option<Weight> {
        self.tasks.get(&task_id).map(|r| r.weight)
    }

    /// Node the task is committed to, `None` if pending or unknown.
    pub fn node_of(&self, task_id: TaskId) -> Option<NodeId> {
        self.tasks.get(&task_id).and_then(|r| r.node)
    }

    /// Pending queue in scheduling order.
    pub fn pending(&self) -> &[PendingTask] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of known tasks, pending or assigned.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    // ── Assignments ────────────────────────────────────────────────

    /// Committed placements of every registered node.
    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    /// Aggregate committed load of a registered node.
    pub fn node_load(&self, node_id: NodeId) -> Option<Load> {
        let placed = self.assignments.get(&node_id)?;
        Some(self.sum_weights(placed))
    }

    /// Aggregate committed load of every registered node, ascending by id.
    pub fn loads(&self) -> BTreeMap<NodeId, Load> {
        self.nodes
            .iter()
            .map(|&node_id| (node_id, self.node_load(node_id).unwrap_or(0)))
            .collect()
    }

    /// Replace the committed placements in full.
    ///
    /// Every node in `next` must be registered and every task known.
    /// Placed tasks leave the pending queue; previously assigned tasks
    /// missing from `next` return to it. Registered nodes absent from
    /// `next` end up with no tasks.
    pub fn commit(&mut self, next: Assignments) -> StateResult<()> {
        let mut placed = HashSet::new();
        for (&node_id, tasks) in &next {
            if !self.nodes.contains(&node_id) {
                return Err(StateError::NodeNotFound(node_id));
            }
            for &task_id in tasks {
                if !self.tasks.contains_key(&task_id) {
                    return Err(StateError::TaskNotFound(task_id));
                }
                placed.insert(task_id);
            }
        }

        let dropped: Vec<TaskId> = self
            .assignments
            .values()
            .flatten()
            .copied()
            .filter(|id| !placed.contains(id))
            .collect();
        for task_id in dropped {
            self.release(task_id);
        }

        self.pending.retain(|t| !placed.contains(&t.id));
        for (&node_id, tasks) in &next {
            for task_id in tasks {
                if let Some(record) = self.tasks.get_mut(task_id) {
                    record.node = Some(node_id);
                }
            }
        }

        let mut assignments = next;
        for &node_id in &self.nodes {
            assignments.entry(node_id).or_default();
        }
        self.assignments = assignments;

        info!(
            placed = placed.len(),
            pending = self.pending.len(),
            "assignments committed"
        );
        Ok(())
    }

    // ── Threshold ──────────────────────────────────────────────────

    /// Threshold of the most recent scheduling call.
    pub fn threshold(&self) -> Option<Threshold> {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.threshold = Some(threshold);
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn sum_weights(&self, tasks: &[TaskId]) -> Load {
        tasks
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|r| Load::from(r.weight))
            .sum()
    }

    /// Insert into the pending queue at its ordered position.
    fn enqueue(&mut self, task: PendingTask) {
        let key = task.queue_key();
        let pos = self.pending.partition_point(|t| t.queue_key() < key);
        self.pending.insert(pos, task);
    }

    /// Move an assigned task back to the pending queue.
    fn release(&mut self, task_id: TaskId) {
        let Some(record) = self.tasks.get_mut(&task_id) else {
            return;
        };
        record.node = None;
        let task = PendingTask {
            id: task_id,
            weight: record.weight,
            seq: record.seq,
        };
        self.enqueue(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(nodes: &[NodeId], tasks: &[(TaskId, Weight)]) -> TaskStore {
        let mut store = TaskStore::new();
        for &n in nodes {
            store.register_node(n).unwrap();
        }
        for &(t, w) in tasks {
            store.add_task(t, w).unwrap();
        }
        store
    }

    fn pending_ids(store: &TaskStore) -> Vec<TaskId> {
        store.pending().iter().map(|t| t.id).collect()
    }

    #[test]
    fn register_rejects_non_positive_ids() {
        let mut store = TaskStore::new();
        assert_eq!(store.register_node(0), Err(StateError::InvalidNodeId(0)));
        assert_eq!(store.register_node(-4), Err(StateError::InvalidNodeId(-4)));
        assert_eq!(store.node_count(), 0);
        assert!(store.assignments().is_empty());
    }

    #[test]
    fn register_duplicate_is_rejected() {
        let mut store = store_with(&[7], &[]);
        assert_eq!(
            store.register_node(7),
            Err(StateError::NodeAlreadyRegistered(7))
        );
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn nodes_iterate_in_ascending_order() {
        let store = store_with(&[5, 1, 3], &[]);
        assert_eq!(store.nodes().collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn unregister_validates_id_and_presence() {
        let mut store = store_with(&[1], &[]);
        assert_eq!(store.unregister_node(0), Err(StateError::InvalidNodeId(0)));
        assert_eq!(store.unregister_node(2), Err(StateError::NodeNotFound(2)));
        assert_eq!(store.unregister_node(1), Ok(vec![]));
        assert!(!store.is_registered(1));
    }

    #[test]
    fn pending_queue_orders_by_weight_then_insertion() {
        let store = store_with(&[], &[(1, 3), (2, 8), (3, 3), (4, 8), (5, 1)]);
        assert_eq!(pending_ids(&store), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn add_task_validation() {
        let mut store = store_with(&[], &[(1, 3)]);
        assert_eq!(store.add_task(0, 3), Err(StateError::InvalidTaskId(0)));
        assert_eq!(
            store.add_task(2, 0),
            Err(StateError::InvalidWeight {
                task_id: 2,
                weight: 0
            })
        );
        assert_eq!(store.add_task(1, 9), Err(StateError::TaskAlreadyExists(1)));
        assert_eq!(store.weight_of(1), Some(3));
        assert_eq!(store.task_count(), 1);
    }

    #[test]
    fn add_task_rejects_assigned_id() {
        let mut store = store_with(&[1], &[(10, 4)]);
        store.commit(Assignments::from([(1, vec![10])])).unwrap();
        assert_eq!(store.add_task(10, 2), Err(StateError::TaskAlreadyExists(10)));
    }

    #[test]
    fn delete_pending_and_assigned_tasks() {
        let mut store = store_with(&[1], &[(10, 4), (20, 2)]);
        store.commit(Assignments::from([(1, vec![10])])).unwrap();

        assert_eq!(store.delete_task(20), Ok(None));
        assert_eq!(store.delete_task(10), Ok(Some(1)));
        assert_eq!(store.delete_task(10), Err(StateError::TaskNotFound(10)));
        assert_eq!(store.delete_task(-1), Err(StateError::InvalidTaskId(-1)));
        assert!(!store.has_pending());
        assert_eq!(store.node_load(1), Some(0));
    }

    #[test]
    fn commit_moves_tasks_out_of_pending() {
        let mut store = store_with(&[1, 2], &[(10, 5), (20, 3)]);
        store
            .commit(Assignments::from([(1, vec![10]), (2, vec![20])]))
            .unwrap();

        assert!(!store.has_pending());
        assert_eq!(store.node_of(10), Some(1));
        assert_eq!(store.node_of(20), Some(2));
        assert_eq!(store.loads(), BTreeMap::from([(1, 5), (2, 3)]));
    }

    #[test]
    fn commit_rejects_unknown_node_or_task_without_changes() {
        let mut store = store_with(&[1], &[(10, 5)]);
        assert_eq!(
            store.commit(Assignments::from([(9, vec![10])])),
            Err(StateError::NodeNotFound(9))
        );
        assert_eq!(
            store.commit(Assignments::from([(1, vec![99])])),
            Err(StateError::TaskNotFound(99))
        );
        assert_eq!(pending_ids(&store), vec![10]);
        assert_eq!(store.node_of(10), None);
    }

    #[test]
    fn commit_releases_tasks_missing_from_new_map() {
        let mut store = store_with(&[1], &[(10, 5), (20, 3)]);
        store.commit(Assignments::from([(1, vec![10, 20])])).unwrap();
        store.commit(Assignments::from([(1, vec![20])])).unwrap();

        assert_eq!(pending_ids(&store), vec![10]);
        assert_eq!(store.node_of(20), Some(1));
    }

    #[test]
    fn unregister_returns_tasks_to_pending_with_original_order() {
        let mut store = store_with(&[1, 2], &[(10, 5), (20, 5), (30, 5)]);
        store
            .commit(Assignments::from([(1, vec![10, 30]), (2, vec![20])]))
            .unwrap();

        let released = store.unregister_node(1).unwrap();
        assert_eq!(released, vec![10, 30]);
        assert_eq!(pending_ids(&store), vec![10, 30]);
        assert_eq!(store.node_of(20), Some(2));
        assert_eq!(store.loads(), BTreeMap::from([(2, 5)]));

        store.add_task(40, 5).unwrap();
        assert_eq!(pending_ids(&store), vec![10, 30, 40]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = store_with(&[1, 2], &[(10, 5)]);
        store.set_threshold(3);
        store.reset();

        assert_eq!(store.node_count(), 0);
        assert_eq!(store.task_count(), 0);
        assert!(store.assignments().is_empty());
        assert_eq!(store.threshold(), None);
        store.add_task(10, 1).unwrap();
        assert_eq!(store.pending()[0].seq, 0);
    }
}
