/*
balance.rs

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

//! Compare the weights of the paths from the start to the final boss.
//!
//! The weight of a path is the sum of the weights of its nodes, start and final boss included.
//! The lightest and heaviest weights are computed over the whole graph, whereas the per-path
//! breakdown is limited to [`MAX_LISTED_PATHS`] paths.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::dag::{Dag, NodeId};

/// Maximum number of paths listed in a [`BalanceReport`].
pub const MAX_LISTED_PATHS: usize = 256;

/// Path from the start to the final boss.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PathWeight {
    pub nodes: Vec<NodeId>,
    pub weight: u32,
}

/// Weight spread over the paths is above the tolerance.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct BudgetWarning {
    pub spread: u32,
    pub tolerance: u32,
}

impl std::fmt::Display for BudgetWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "path weights differ by {}, above the tolerance of {}",
            self.spread, self.tolerance
        )
    }
}

/// Result of the analysis.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BalanceReport {
    /// Listed paths, in depth-first order.
    pub paths: Vec<PathWeight>,

    /// Total number of paths in the graph.
    pub num_paths: usize,
    pub min_weight: u32,
    pub max_weight: u32,
    pub spread: u32,
}

impl BalanceReport {
    /// Return a warning if the spread is above the tolerance.
    pub fn check(&self, tolerance: u32) -> Option<BudgetWarning> {
        if self.spread > tolerance {
            warn!("Path weights differ by {} (tolerance {tolerance})", self.spread);
            Some(BudgetWarning {
                spread: self.spread,
                tolerance,
            })
        } else {
            None
        }
    }
}

/// Analyze the weight of every path from the start to the final boss.
///
/// Return an empty report if the graph has no final boss or has a cycle.
pub fn analyze(dag: &Dag) -> BalanceReport {
    let end: NodeId = match dag.end() {
        Some(e) => e,
        None => return BalanceReport::default(),
    };
    let order: Vec<NodeId> = match dag.topological_order() {
        Some(o) => o,
        None => return BalanceReport::default(),
    };
    let weight = |id: NodeId| dag.node(id).map_or(0, |n| n.weight);

    // Lightest weight, heaviest weight, and number of paths from the start to each node
    let mut best: HashMap<NodeId, (u32, u32, usize)> = HashMap::with_capacity(dag.len());
    best.insert(dag.start(), (weight(dag.start()), weight(dag.start()), 1));
    for id in order {
        let (lo, hi, count) = match best.get(&id) {
            Some(b) => *b,
            None => continue,
        };
        for succ in dag.successors(id) {
            let w: u32 = weight(succ);
            let entry = best.entry(succ).or_insert((u32::MAX, 0, 0));
            entry.0 = entry.0.min(lo.saturating_add(w));
            entry.1 = entry.1.max(hi.saturating_add(w));
            entry.2 += count;
        }
    }
    let (min_weight, max_weight, num_paths) = match best.get(&end) {
        Some(b) => *b,
        None => return BalanceReport::default(),
    };

    let mut paths: Vec<PathWeight> = Vec::new();
    let mut current: Vec<NodeId> = vec![dag.start()];
    list_paths(dag, end, &mut current, weight(dag.start()), &mut paths);

    BalanceReport {
        paths,
        num_paths,
        min_weight,
        max_weight,
        spread: max_weight - min_weight,
    }
}

/// Recursively list the paths to `end`.
fn list_paths(
    dag: &Dag,
    end: NodeId,
    current: &mut Vec<NodeId>,
    weight: u32,
    paths: &mut Vec<PathWeight>,
) {
    if paths.len() >= MAX_LISTED_PATHS {
        return;
    }
    let last: NodeId = match current.last() {
        Some(l) => *l,
        None => return,
    };
    if last == end {
        paths.push(PathWeight {
            nodes: current.clone(),
            weight,
        });
        return;
    }
    for succ in dag.successors(last) {
        let w: u32 = dag.node(succ).map_or(0, |n| n.weight);
        current.push(succ);
        list_paths(dag, end, current, weight.saturating_add(w), paths);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::cluster::{Cluster, ClusterType};

    /// Start and end of weight 1, and one middle node per path.
    fn fan(middle_weights: &[u32]) -> Dag {
        let mut dag: Dag = Dag::new();
        let start = dag.add_node(&Cluster::new("start", ClusterType::Start, 1), 0, 1, Vec::new());
        dag.set_start(start);
        let middles: Vec<NodeId> = middle_weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let c: Cluster = Cluster::new(&format!("m{i}"), ClusterType::MiniDungeon, *w);
                let id = dag.add_node(&c, 1, 1, Vec::new());
                dag.connect(start, &format!("s{i}"), id, "in");
                id
            })
            .collect();
        let end = dag.add_node(&Cluster::new("end", ClusterType::FinalBoss, 1), 2, 1, Vec::new());
        for m in middles {
            dag.connect(m, "out", end, "in");
        }
        dag.set_end(end);
        dag
    }

    #[test]
    fn spread_above_tolerance() {
        let report: BalanceReport = analyze(&fan(&[10, 13, 18]));
        let mut weights: Vec<u32> = report.paths.iter().map(|p| p.weight).collect();
        weights.sort_unstable();
        assert_eq!(weights, vec![12, 15, 20]);
        assert_eq!(report.num_paths, 3);
        assert_eq!(report.spread, 8);
        assert_eq!(
            report.check(5),
            Some(BudgetWarning {
                spread: 8,
                tolerance: 5
            })
        );
    }

    #[test]
    fn spread_within_tolerance() {
        let report: BalanceReport = analyze(&fan(&[10, 12, 14]));
        assert_eq!(report.min_weight, 12);
        assert_eq!(report.max_weight, 16);
        assert_eq!(report.spread, 4);
        assert_eq!(report.check(5), None);
        // The tolerance is inclusive
        assert_eq!(report.check(4), None);
    }

    #[test]
    fn diamond_chain_counts_paths() {
        // Two diamonds in a row: four paths
        let mut dag: Dag = Dag::new();
        let c = |id: &str, w: u32| Cluster::new(id, ClusterType::MiniDungeon, w);
        let s = dag.add_node(&c("s", 0), 0, 1, Vec::new());
        let a = dag.add_node(&c("a", 1), 1, 1, Vec::new());
        let b = dag.add_node(&c("b", 2), 1, 1, Vec::new());
        let m = dag.add_node(&c("m", 0), 2, 1, Vec::new());
        let x = dag.add_node(&c("x", 10), 3, 1, Vec::new());
        let y = dag.add_node(&c("y", 20), 3, 1, Vec::new());
        let e = dag.add_node(&c("e", 0), 4, 1, Vec::new());
        for (from, to) in [(s, a), (s, b), (a, m), (b, m), (m, x), (m, y), (x, e), (y, e)] {
            dag.connect(from, "o", to, "i");
        }
        dag.set_start(s);
        dag.set_end(e);
        let report: BalanceReport = analyze(&dag);
        assert_eq!(report.num_paths, 4);
        assert_eq!(report.paths.len(), 4);
        assert_eq!(report.min_weight, 11);
        assert_eq!(report.max_weight, 22);
        assert_eq!(report.spread, 11);
    }

    #[test]
    fn unfinished_graph_has_empty_report() {
        let dag: Dag = fan(&[1, 2]);
        let mut unfinished: Dag = Dag::new();
        let s = unfinished.add_node(&Cluster::new("s", ClusterType::Start, 1), 0, 1, Vec::new());
        unfinished.set_start(s);
        assert_eq!(analyze(&unfinished), BalanceReport::default());
        assert_eq!(analyze(&dag).num_paths, 2);
    }
}
