use std::collections::BTreeSet;

use crate::circuit::{Circuit, NodeIdx};

/// Forward and reverse adjacency of a [`Circuit`].
///
/// Every slot of the circuit has an entry in both directions, isolated nodes
/// included, so traversals never have to deal with a missing key.
#[derive(Clone, Debug)]
pub struct Graph {
    children: Vec<BTreeSet<NodeIdx>>,
    parents: Vec<BTreeSet<NodeIdx>>,
}

impl Graph {
    pub fn build(circuit: &Circuit) -> Self {
        let num_nodes = circuit.num_nodes();
        let mut children = vec![BTreeSet::new(); num_nodes];
        let mut parents = vec![BTreeSet::new(); num_nodes];
        for link in circuit.links() {
            children[link.source].insert(link.target);
            parents[link.target].insert(link.source);
        }
        Graph { children, parents }
    }

    pub fn num_nodes(&self) -> usize {
        self.children.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeIdx> {
        (0..self.num_nodes()).map(NodeIdx::from)
    }

    /// Downstream neighbours.
    pub fn children(&self, idx: NodeIdx) -> &BTreeSet<NodeIdx> {
        &self.children[idx]
    }

    /// Upstream neighbours.
    pub fn parents(&self, idx: NodeIdx) -> &BTreeSet<NodeIdx> {
        &self.parents[idx]
    }

    pub fn is_connected(&self, idx: NodeIdx) -> bool {
        !self.children[idx].is_empty() || !self.parents[idx].is_empty()
    }
}
