//! Balance evaluation over per-node aggregate loads.
//!
//! A distribution is balanced when every pair of distinct nodes differs by
//! at most the threshold. That holds exactly when the heaviest and the
//! lightest node are within the threshold, so a single pass suffices.

use std::collections::BTreeMap;

use taskgrid_state::{Load, NodeId, TaskStore, Threshold, Weight};

/// Outcome of a balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Balanced,
    Unbalanced {
        heaviest: NodeId,
        lightest: NodeId,
        spread: Load,
    },
}

impl Balance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, Balance::Balanced)
    }
}

/// Check whether the given loads are within `threshold` of each other.
///
/// Ties between equally heavy or equally light nodes resolve to the
/// first one yielded. Zero or one node is always balanced.
pub fn evaluate<I>(loads: I, threshold: Threshold) -> Balance
where
    I: IntoIterator<Item = (NodeId, Load)>,
{
    let mut iter = loads.into_iter();
    let Some(first) = iter.next() else {
        return Balance::Balanced;
    };

    let (mut heaviest, mut lightest) = (first, first);
    for (node_id, load) in iter {
        if load > heaviest.1 {
            heaviest = (node_id, load);
        }
        if load < lightest.1 {
            lightest = (node_id, load);
        }
    }

    let spread = heaviest.1 - lightest.1;
    if spread > Load::from(threshold) {
        Balance::Unbalanced {
            heaviest: heaviest.0,
            lightest: lightest.0,
            spread,
        }
    } else {
        Balance::Balanced
    }
}

/// Cached aggregate load per node, updated one placement at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadTable {
    loads: BTreeMap<NodeId, Load>,
}

impl LoadTable {
    /// Start from the committed loads of every registered node.
    pub fn from_store(store: &TaskStore) -> Self {
        Self {
            loads: store.loads(),
        }
    }

    /// Node with the smallest load; ties go to the smallest node id.
    pub fn least_loaded(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, Load)> = None;
        for (&node_id, &load) in &self.loads {
            match best {
                Some((_, min)) if load >= min => {}
                _ => best = Some((node_id, load)),
            }
        }
        best.map(|(node_id, _)| node_id)
    }

    /// Add a task's weight to a node, registering the node if needed.
    pub fn add(&mut self, node_id: NodeId, weight: Weight) {
        *self.loads.entry(node_id).or_insert(0) += Load::from(weight);
    }

    pub fn get(&self, node_id: NodeId) -> Option<Load> {
        self.loads.get(&node_id).copied()
    }

    /// Loads in ascending node id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Load)> + '_ {
        self.loads.iter().map(|(&n, &l)| (n, l))
    }

    /// Difference between the heaviest and the lightest node.
    pub fn spread(&self) -> Load {
        let max = self.loads.values().max().copied().unwrap_or(0);
        let min = self.loads.values().min().copied().unwrap_or(0);
        max - min
    }

    pub fn evaluate(&self, threshold: Threshold) -> Balance {
        evaluate(self.iter(), threshold)
    }

    pub fn into_inner(self) -> BTreeMap<NodeId, Load> {
        self.loads
    }
}

impl FromIterator<(NodeId, Load)> for LoadTable {
    fn from_iter<I: IntoIterator<Item = (NodeId, Load)>>(iter: I) -> Self {
        Self {
            loads: iter.into_iter().collect(),
        }
    }
}
