/*
dag.rs

Copyright 2025 Hervé Quatremain

This file is part of Fogdag.

Fogdag is free software: you can redistribute it and/or modify it under the
terms of the GNU General Public License as published by the Free Software
Foundation, either version 3 of the License, or (at your option) any later
version.

Fogdag is distributed in the hope that it will be useful, but WITHOUT ANY
WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
A PARTICULAR PURPOSE. See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License along with
Fogdag. If not, see <https://www.gnu.org/licenses/>.

SPDX-License-Identifier: GPL-3.0-or-later
*/

//! Route graph.
//!
//! A [`Dag`] is made of [`DagNode`] objects, one per placed cluster, linked by [`DagEdge`]
//! objects.
//! Each node copies the data of its cluster and records the fog gates actually wired, so that the
//! graph can be written out without going back to the cluster pool.
//!
//! [`Branch`] objects only exist while the graph is being built.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

use super::cluster::{Cluster, ClusterType};

/// Node identifier.
pub type NodeId = usize;

/// Branch identifier.
pub type BranchId = usize;

/// Fog gate wired to another node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FogLink {
    /// Fog gate identifier in the node's cluster.
    pub fog: String,

    /// Node on the other side of the fog gate.
    pub peer: NodeId,
}

/// Placement of a cluster in the graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DagNode {
    pub id: NodeId,
    pub cluster: String,
    pub zones: Vec<String>,
    pub cluster_type: ClusterType,

    /// Construction layer. The start node is in layer 0.
    pub layer: usize,

    /// Difficulty tier.
    pub tier: u32,
    pub weight: u32,

    /// Entry fog gates, one per incoming edge.
    pub entries: Vec<FogLink>,

    /// Exit fog gates, one per outgoing edge.
    pub exits: Vec<FogLink>,

    /// Exit fog gates not wired yet.
    pub open_exits: Vec<String>,

    /// Whether several incoming edges use the same entry fog gate.
    pub shared_entrance: bool,
}

/// Directed connection between two nodes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DagEdge {
    pub from: NodeId,
    pub to: NodeId,

    /// Exit fog gate in the source node.
    pub exit: String,

    /// Entry fog gate in the target node.
    pub entry: String,
}

/// Path in progress during the graph construction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: BranchId,

    /// Branches this branch comes from. Empty for the branches leaving the start node, one parent
    /// after a split, several after a merge.
    pub parents: Vec<BranchId>,

    /// Node where the branch currently ends.
    pub node: NodeId,

    /// Exit fog gate of [`Branch::node`] reserved for the next step.
    pub exit: String,
}

/// Whether merging the given branches would only undo the split that created them.
pub fn is_micro_merge(branches: &[&Branch]) -> bool {
    match branches.first() {
        Some(first) => branches.iter().all(|b| b.node == first.node),
        None => false,
    }
}

/// Route graph.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Dag {
    nodes: BTreeMap<NodeId, DagNode>,
    edges: Vec<DagEdge>,
    start: NodeId,
    end: Option<NodeId>,
}

impl Dag {
    /// Create an empty [`Dag`] object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node for the given cluster and return its identifier.
    pub fn add_node(
        &mut self,
        cluster: &Cluster,
        layer: usize,
        tier: u32,
        open_exits: Vec<String>,
    ) -> NodeId {
        let id: NodeId = self.nodes.len();
        self.nodes.insert(
            id,
            DagNode {
                id,
                cluster: cluster.id.clone(),
                zones: cluster.zones.clone(),
                cluster_type: cluster.cluster_type,
                layer,
                tier,
                weight: cluster.weight,
                entries: Vec::new(),
                exits: Vec::new(),
                open_exits,
                shared_entrance: false,
            },
        );
        id
    }

    /// Connect the `exit` fog gate of `from` to the `entry` fog gate of `to`.
    ///
    /// Connecting an unknown node is ignored.
    pub fn connect(&mut self, from: NodeId, exit: &str, to: NodeId, entry: &str) {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return;
        }
        if let Some(n) = self.nodes.get_mut(&from) {
            n.exits.push(FogLink {
                fog: exit.to_string(),
                peer: to,
            });
            if let Some(pos) = n.open_exits.iter().position(|e| e == exit) {
                n.open_exits.remove(pos);
            }
        }
        if let Some(n) = self.nodes.get_mut(&to) {
            n.entries.push(FogLink {
                fog: entry.to_string(),
                peer: from,
            });
        }
        self.edges.push(DagEdge {
            from,
            to,
            exit: exit.to_string(),
            entry: entry.to_string(),
        });
    }

    pub fn set_start(&mut self, node: NodeId) {
        self.start = node;
    }

    pub fn set_end(&mut self, node: NodeId) {
        self.end = Some(node);
    }

    /// Mark the node as receiving several branches through the same entry.
    pub fn set_shared_entrance(&mut self, node: NodeId, shared: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.shared_entrance = shared;
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Terminal node, once the graph is complete.
    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    pub fn node(&self, id: NodeId) -> Option<&DagNode> {
        self.nodes.get(&id)
    }

    /// Nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &DagNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[DagEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Targets of the outgoing edges of the node, in edge creation order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to)
            .collect()
    }

    /// Sources of the incoming edges of the node, in edge creation order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from)
            .collect()
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.edges.iter().filter(|e| e.to == id).count()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.edges.iter().filter(|e| e.from == id).count()
    }

    /// Nodes reachable from `from` by following the edges forward, `from` included.
    pub fn reachable_from(&self, from: NodeId) -> HashSet<NodeId> {
        self.walk(from, |dag, id| dag.successors(id))
    }

    /// Nodes from which `to` can be reached by following the edges forward, `to` included.
    pub fn reaching(&self, to: NodeId) -> HashSet<NodeId> {
        self.walk(to, |dag, id| dag.predecessors(id))
    }

    fn walk<F>(&self, origin: NodeId, next: F) -> HashSet<NodeId>
    where
        F: Fn(&Self, NodeId) -> Vec<NodeId>,
    {
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(self.nodes.len());
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        if self.nodes.contains_key(&origin) {
            seen.insert(origin);
            queue.push_back(origin);
        }
        while let Some(id) = queue.pop_front() {
            for n in next(self, id) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    /// Return the nodes in topological order, or `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        let mut in_degree: BTreeMap<NodeId, usize> =
            self.nodes.keys().map(|id| (*id, 0)).collect();
        for e in &self.edges {
            if let Some(d) = in_degree.get_mut(&e.to) {
                *d += 1;
            }
        }
        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for n in self.successors(id) {
                if let Some(d) = in_degree.get_mut(&n) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(n);
                    }
                }
            }
        }
        if order.len() == self.nodes.len() {
            Some(order)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(id: &str) -> Cluster {
        Cluster::new(id, ClusterType::MiniDungeon, 2)
    }

    #[test]
    fn connect_records_both_sides() {
        let mut dag: Dag = Dag::new();
        let a: NodeId = dag.add_node(&cluster("a"), 0, 1, vec!["a_out".to_string()]);
        let b: NodeId = dag.add_node(&cluster("b"), 1, 2, Vec::new());
        dag.connect(a, "a_out", b, "b_in");

        let na = dag.node(a).unwrap();
        assert!(na.open_exits.is_empty());
        assert_eq!(
            na.exits,
            vec![FogLink {
                fog: "a_out".to_string(),
                peer: b
            }]
        );
        assert_eq!(dag.node(b).unwrap().entries[0].peer, a);
        assert_eq!(dag.successors(a), vec![b]);
        assert_eq!(dag.predecessors(b), vec![a]);
        assert_eq!(dag.out_degree(a), 1);
        assert_eq!(dag.in_degree(a), 0);
    }

    #[test]
    fn unknown_nodes_are_not_connected() {
        let mut dag: Dag = Dag::new();
        let a: NodeId = dag.add_node(&cluster("a"), 0, 1, Vec::new());
        dag.connect(a, "x", 42, "y");
        assert!(dag.edges().is_empty());
        assert!(dag.node(a).unwrap().exits.is_empty());
    }

    #[test]
    fn topological_order_detects_cycles() {
        let mut dag: Dag = Dag::new();
        let a: NodeId = dag.add_node(&cluster("a"), 0, 1, Vec::new());
        let b: NodeId = dag.add_node(&cluster("b"), 1, 1, Vec::new());
        let c: NodeId = dag.add_node(&cluster("c"), 2, 1, Vec::new());
        dag.connect(a, "1", b, "1");
        dag.connect(b, "2", c, "2");
        assert_eq!(dag.topological_order(), Some(vec![a, b, c]));
        assert_eq!(dag.reachable_from(b).len(), 2);
        assert_eq!(dag.reaching(b).len(), 2);

        dag.connect(c, "3", a, "3");
        assert_eq!(dag.topological_order(), None);
    }

    #[test]
    fn micro_merge_detection() {
        let branch = |id: BranchId, node: NodeId| Branch {
            id,
            parents: vec![0],
            node,
            exit: format!("exit{id}"),
        };
        let (b1, b2, b3) = (branch(1, 4), branch(2, 4), branch(3, 5));
        assert!(is_micro_merge(&[&b1, &b2]));
        assert!(!is_micro_merge(&[&b1, &b2, &b3]));
        assert!(!is_micro_merge(&[]));
    }
}
