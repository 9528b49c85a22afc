//! Interference graph.
//!
//! Two parallel representations, selected by use: a sorted `Vec<(u32,u32)>`
//! for dumping/iteration, and a per-node `HashSet<u32>` for O(1) membership
//! queries (`phi_ops_interfere`). Edges are canonicalized `(min, max)`.

use crate::common::fx_hash::{FxHashMap, FxHashSet};
use crate::ir::NodeId;

#[derive(Debug, Default)]
pub struct InterferenceGraph {
    edges: FxHashSet<(NodeId, NodeId)>,
    neighbors: FxHashMap<NodeId, FxHashSet<NodeId>>,
}

fn canon(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl InterferenceGraph {
    pub fn new() -> Self {
        InterferenceGraph::default()
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let edge = canon(a, b);
        if self.edges.insert(edge) {
            self.neighbors.entry(a).or_default().insert(b);
            self.neighbors.entry(b).or_default().insert(a);
        }
    }

    pub fn interferes(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.contains(&canon(a, b))
    }

    pub fn neighbors(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.get(&n).into_iter().flatten().copied()
    }

    /// Sorted edge list, for dumping or golden-output comparisons.
    pub fn sorted_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut v: Vec<_> = self.edges.iter().copied().collect();
        v.sort_unstable();
        v
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }
}
