/*
validator.rs

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

//! Verify a finished route graph.
//!
//! Structural and content problems are reported as [`ValidationIssue`] objects and make the
//! attempt fail.
//! An unbalanced graph only produces a [`BudgetWarning`].

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use strum_macros::Display;

use super::balance::{self, BalanceReport, BudgetWarning};
use super::cluster::ClusterType;
use super::dag::{Dag, NodeId};
use crate::config::GeneratorConfig;

/// Validation checks.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ValidationCheck {
    /// The graph has a single final node without exits.
    Terminal,

    /// No node can reach itself.
    Acyclic,

    /// Every node can be reached from the start.
    Reachability,

    /// The final node can be reached from every node.
    Termination,

    /// No two edges link the same nodes.
    DuplicateEdge,

    /// Each incoming edge uses its own entry, unless the node shares its entrance.
    EntryAccounting,

    /// The required number of clusters of each type is present.
    MinimumContent,
}

/// Failed check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub check: ValidationCheck,
    pub detail: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.detail)
    }
}

/// Result of the validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Failed checks. Any failure invalidates the graph.
    pub failures: Vec<ValidationIssue>,

    pub balance: BalanceReport,

    /// Advisory only: the graph is still valid.
    pub budget_warning: Option<BudgetWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, check: ValidationCheck, detail: String) {
        debug!("Validation: {check}: {detail}");
        self.failures.push(ValidationIssue { check, detail });
    }
}

/// Run all the checks on the graph.
pub fn validate(dag: &Dag, config: &GeneratorConfig) -> ValidationReport {
    let mut report: ValidationReport = ValidationReport::default();

    let end: Option<NodeId> = dag.end();
    match end {
        Some(e) if dag.out_degree(e) > 0 => report.fail(
            ValidationCheck::Terminal,
            format!("final node {e} has outgoing edges"),
        ),
        Some(_) => (),
        None => report.fail(ValidationCheck::Terminal, "no final node".to_string()),
    }

    let acyclic: bool = dag.topological_order().is_some();
    if !acyclic {
        report.fail(ValidationCheck::Acyclic, "the graph has a cycle".to_string());
    }

    check_connectivity(dag, &mut report);
    check_duplicate_edges(dag, &mut report);
    check_entries(dag, &mut report);
    check_content(dag, config, &mut report);

    // The path analysis needs a finished acyclic graph
    if acyclic && end.is_some() {
        report.balance = balance::analyze(dag);
        report.budget_warning = report.balance.check(config.budget_tolerance);
    }
    report
}

fn check_connectivity(dag: &Dag, report: &mut ValidationReport) {
    let from_start: HashSet<NodeId> = dag.reachable_from(dag.start());
    let to_end: HashSet<NodeId> = match dag.end() {
        Some(e) => dag.reaching(e),
        None => HashSet::new(),
    };
    for node in dag.nodes() {
        if !from_start.contains(&node.id) {
            report.fail(
                ValidationCheck::Reachability,
                format!("node {} ({}) cannot be reached from the start", node.id, node.cluster),
            );
        }
        if dag.end().is_some() && !to_end.contains(&node.id) {
            report.fail(
                ValidationCheck::Termination,
                format!("node {} ({}) is a dead end", node.id, node.cluster),
            );
        }
    }
}

fn check_duplicate_edges(dag: &Dag, report: &mut ValidationReport) {
    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::with_capacity(dag.edges().len());
    for e in dag.edges() {
        if !seen.insert((e.from, e.to)) {
            report.fail(
                ValidationCheck::DuplicateEdge,
                format!("several edges from node {} to node {}", e.from, e.to),
            );
        }
    }
}

fn check_entries(dag: &Dag, report: &mut ValidationReport) {
    for node in dag.nodes() {
        let incoming: usize = dag.in_degree(node.id);
        let distinct: usize = node
            .entries
            .iter()
            .map(|f| f.fog.as_str())
            .collect::<HashSet<&str>>()
            .len();

        if node.entries.len() != incoming {
            report.fail(
                ValidationCheck::EntryAccounting,
                format!(
                    "node {} ({}) has {} wired entries for {incoming} incoming edges",
                    node.id,
                    node.cluster,
                    node.entries.len()
                ),
            );
        } else if node.shared_entrance {
            if incoming == 0 {
                report.fail(
                    ValidationCheck::EntryAccounting,
                    format!(
                        "node {} ({}) shares an entrance without incoming edges",
                        node.id, node.cluster
                    ),
                );
            }
        } else if distinct != incoming {
            report.fail(
                ValidationCheck::EntryAccounting,
                format!(
                    "node {} ({}) uses {distinct} entries for {incoming} incoming edges",
                    node.id, node.cluster
                ),
            );
        }
    }
}

fn check_content(dag: &Dag, config: &GeneratorConfig, report: &mut ValidationReport) {
    let mut counts: BTreeMap<ClusterType, usize> = BTreeMap::new();
    for node in dag.nodes() {
        *counts.entry(node.cluster_type).or_insert(0) += 1;
    }
    for (t, required) in &config.requirements {
        let found: usize = counts.get(t).copied().unwrap_or(0);
        if found < *required {
            report.fail(
                ValidationCheck::MinimumContent,
                format!("{found} {t} clusters, {required} required"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::cluster::Cluster;

    fn node(dag: &mut Dag, id: &str, t: ClusterType, weight: u32) -> NodeId {
        dag.add_node(&Cluster::new(id, t, weight), 0, 1, Vec::new())
    }

    /// start -> {a, b, c} -> end, with the given weights for a, b, and c.
    fn fan(weights: [u32; 3]) -> Dag {
        let mut dag: Dag = Dag::new();
        let s = node(&mut dag, "start", ClusterType::Start, 1);
        let e = node(&mut dag, "end", ClusterType::FinalBoss, 1);
        for (i, w) in weights.iter().enumerate() {
            let m = node(&mut dag, &format!("m{i}"), ClusterType::MiniDungeon, *w);
            dag.connect(s, &format!("s{i}"), m, "in");
            dag.connect(m, "out", e, &format!("e{i}"));
        }
        dag.set_start(s);
        dag.set_end(e);
        dag
    }

    fn config(tolerance: u32) -> GeneratorConfig {
        GeneratorConfig {
            budget_tolerance: tolerance,
            requirements: BTreeMap::from([(ClusterType::MiniDungeon, 3)]),
            ..GeneratorConfig::default()
        }
    }

    fn checks(report: &ValidationReport) -> Vec<ValidationCheck> {
        report.failures.iter().map(|f| f.check).collect()
    }

    #[test]
    fn budget_warning_is_advisory() {
        let report = validate(&fan([10, 13, 18]), &config(5));
        assert!(report.is_valid());
        assert_eq!(report.balance.spread, 8);
        assert_eq!(
            report.budget_warning,
            Some(BudgetWarning {
                spread: 8,
                tolerance: 5
            })
        );

        let report = validate(&fan([10, 12, 14]), &config(5));
        assert!(report.is_valid());
        assert_eq!(report.balance.spread, 4);
        assert_eq!(report.budget_warning, None);
    }

    #[test]
    fn missing_content() {
        let config = GeneratorConfig {
            requirements: BTreeMap::from([(ClusterType::LegacyDungeon, 1)]),
            ..config(100)
        };
        let report = validate(&fan([1, 1, 1]), &config);
        assert_eq!(checks(&report), vec![ValidationCheck::MinimumContent]);
    }

    #[test]
    fn dead_end_and_orphan() {
        let mut dag: Dag = fan([1, 1, 1]);
        let dead = node(&mut dag, "dead", ClusterType::MiniDungeon, 1);
        dag.connect(dag.start(), "s9", dead, "in");
        let orphan = node(&mut dag, "orphan", ClusterType::MiniDungeon, 1);
        let end = dag.end().unwrap();
        dag.connect(orphan, "out", end, "e9");

        let report = validate(&dag, &config(100));
        assert_eq!(
            checks(&report),
            vec![
                ValidationCheck::Termination,
                ValidationCheck::Reachability
            ]
        );
    }

    #[test]
    fn duplicate_edge_and_entry_reuse() {
        let mut dag: Dag = fan([1, 1, 1]);
        let s = dag.start();
        // Second edge between the start and the first middle node, using the same entry
        let m0 = dag.successors(s)[0];
        dag.connect(s, "s8", m0, "in");

        let report = validate(&dag, &config(100));
        assert_eq!(
            checks(&report),
            vec![
                ValidationCheck::DuplicateEdge,
                ValidationCheck::EntryAccounting
            ]
        );
    }

    #[test]
    fn shared_entrance_allows_entry_reuse() {
        let mut dag: Dag = Dag::new();
        let s = node(&mut dag, "start", ClusterType::Start, 1);
        let a = node(&mut dag, "a", ClusterType::MiniDungeon, 1);
        let b = node(&mut dag, "b", ClusterType::MiniDungeon, 1);
        let e = node(&mut dag, "end", ClusterType::FinalBoss, 1);
        dag.connect(s, "s0", a, "in");
        dag.connect(s, "s1", b, "in");
        dag.connect(a, "out", e, "gate");
        dag.connect(b, "out", e, "gate");
        dag.set_start(s);
        dag.set_end(e);
        let config = GeneratorConfig {
            requirements: BTreeMap::new(),
            ..config(100)
        };

        let report = validate(&dag, &config);
        assert_eq!(checks(&report), vec![ValidationCheck::EntryAccounting]);

        dag.set_shared_entrance(e, true);
        assert!(validate(&dag, &config).is_valid());
    }

    #[test]
    fn cycle_and_missing_end() {
        let mut dag: Dag = Dag::new();
        let s = node(&mut dag, "start", ClusterType::Start, 1);
        let a = node(&mut dag, "a", ClusterType::MiniDungeon, 1);
        dag.connect(s, "o", a, "i");
        dag.connect(a, "o", s, "i");
        dag.set_start(s);
        let config = GeneratorConfig {
            requirements: BTreeMap::new(),
            ..config(100)
        };

        let report = validate(&dag, &config);
        assert_eq!(
            checks(&report),
            vec![ValidationCheck::Terminal, ValidationCheck::Acyclic]
        );
        assert_eq!(report.balance, BalanceReport::default());
    }
}
