/*
generation.rs

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

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};

use fogdag::config::GeneratorConfig;
use fogdag::error::GenerationError;
use fogdag::generator::builder::{BuildState, Generator};
use fogdag::generator::cluster::{Cluster, ClusterPool, ClusterType, FogPoint};
use fogdag::generator::compat::{self, Role};
use fogdag::generator::dag::{Dag, NodeId};
use fogdag::generator::planner::LayerPlan;
use fogdag::generator::retry;
use fogdag::generator::validator;
use fogdag::saver::dag::to_json;

fn gate(id: &str, t: ClusterType, weight: u32, entries: usize, exits: usize) -> Cluster {
    let mut c: Cluster = Cluster::new(id, t, weight);
    for i in 0..entries {
        c = c.with_entry(FogPoint::one_way(&format!("{id}_in{i}")));
    }
    for i in 0..exits {
        c = c.with_exit(FogPoint::one_way(&format!("{id}_out{i}")));
    }
    c
}

/// Synthetic pool with clusters of every type and shape.
fn realistic_pool() -> ClusterPool {
    let mut clusters: Vec<Cluster> = vec![gate("chapel", ClusterType::Start, 0, 0, 3)];

    let mut tree: Cluster = gate("erdtree", ClusterType::FinalBoss, 9, 2, 0);
    tree.entries[1].canonical = true;
    tree.allow_shared_entrance = true;
    clusters.push(tree);
    clusters.push(gate("ashen", ClusterType::FinalBoss, 9, 3, 0));

    for (t, weight) in [
        (ClusterType::MiniDungeon, 2),
        (ClusterType::LegacyDungeon, 7),
        (ClusterType::BossArena, 3),
        (ClusterType::MajorBoss, 5),
    ] {
        for i in 0..40 {
            let id: String = format!("{t}_{i}");
            let w: u32 = weight + (i % 3) as u32;
            let c: Cluster = match i % 8 {
                // Bidirectional fog gates
                0 => Cluster::new(&id, t, w)
                    .with_entry(FogPoint::one_way(&format!("{id}_front")))
                    .with_two_way(&format!("{id}_side")),
                1 => {
                    let mut c: Cluster = Cluster::new(&id, t, w).with_two_way(&format!("{id}_a"));
                    c.allow_entry_as_exit = true;
                    c
                }
                2 => gate(&id, t, w, 1, 2),
                3 => gate(&id, t, w, 1, 3),
                4 => gate(&id, t, w, 2, 1),
                5 => {
                    let mut c: Cluster = gate(&id, t, w, 2, 2);
                    c.allow_shared_entrance = true;
                    c
                }
                _ => gate(&id, t, w, 1, 1),
            };
            clusters.push(c);
        }
    }
    ClusterPool::new(clusters)
}

/// Build one graph with the builder directly, to keep the failed attempts.
fn build(pool: &ClusterPool, config: &GeneratorConfig, seed: u64) -> (BuildState, Dag) {
    let roles = pool.resolve_roles(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let plan: LayerPlan = LayerPlan::generate(config, &mut rng);
    let mut generator = Generator::new(pool, &roles, config, &plan, &mut rng);
    let _ = generator.build();
    (generator.state(), generator.into_dag())
}

#[test]
fn same_seed_gives_identical_output() {
    let pool: ClusterPool = realistic_pool();
    let config: GeneratorConfig = GeneratorConfig::default();
    let mut seeds = ChaCha8Rng::seed_from_u64(17);
    let first = retry::generate_with(&pool, &config, None, &mut seeds).unwrap();

    let a = retry::generate(&pool, &config, Some(first.seed)).unwrap();
    let b = retry::generate(&pool, &config, Some(first.seed)).unwrap();
    assert_eq!(to_json(&a).unwrap(), to_json(&b).unwrap());
    assert_eq!(a.dag, first.dag);
}

#[test]
fn structural_properties_over_seeds() {
    let pool: ClusterPool = realistic_pool();
    let config: GeneratorConfig = GeneratorConfig {
        requirements: BTreeMap::new(),
        ..GeneratorConfig::default()
    };
    let mut done: usize = 0;

    for seed in 0..300 {
        let (state, dag) = build(&pool, &config, seed);
        if state != BuildState::Done {
            assert_eq!(state, BuildState::Failed);
            continue;
        }
        done += 1;
        let end: NodeId = dag.end().unwrap();

        // Acyclicity
        assert!(dag.topological_order().is_some(), "seed {seed}: cycle");

        // No dead ends and full connectivity
        let from_start: HashSet<NodeId> = dag.reachable_from(dag.start());
        let to_end: HashSet<NodeId> = dag.reaching(end);
        for node in dag.nodes() {
            if node.id != end {
                assert!(dag.out_degree(node.id) >= 1, "seed {seed}: dead end");
            }
            if node.id != dag.start() {
                assert!(dag.in_degree(node.id) >= 1, "seed {seed}: orphan");
            }
            assert!(from_start.contains(&node.id));
            assert!(to_end.contains(&node.id));
        }
        assert_eq!(dag.out_degree(end), 0);
        assert_eq!(dag.in_degree(dag.start()), 0);

        // Merges never combine branches coming out of a single node, and never duplicate edges
        let mut pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
        for e in dag.edges() {
            assert!(pairs.insert((e.from, e.to)), "seed {seed}: duplicate edge");
        }
        for node in dag.nodes() {
            let preds: Vec<NodeId> = dag.predecessors(node.id);
            if preds.len() >= 2 {
                let distinct: HashSet<NodeId> = preds.iter().copied().collect();
                assert!(distinct.len() >= 2, "seed {seed}: micro merge");
            }
        }

        // Each cluster is placed once, and edges go forward in layers and tiers
        let clusters: HashSet<&str> = dag.nodes().map(|n| n.cluster.as_str()).collect();
        assert_eq!(clusters.len(), dag.len());
        for e in dag.edges() {
            let (from, to) = (dag.node(e.from).unwrap(), dag.node(e.to).unwrap());
            assert!(from.layer < to.layer);
            assert!(from.tier <= to.tier);
        }
        assert!(dag.node(end).unwrap().cluster_type == ClusterType::FinalBoss);
        assert!(dag.out_degree(dag.start()) <= config.max_parallel_paths);

        // Hard checks pass
        let report = validator::validate(&dag, &config);
        assert!(report.is_valid(), "seed {seed}: {:?}", report.failures);
    }
    assert!(done > 0);
}

#[test]
fn two_branch_diamond() {
    let pool = ClusterPool::new(vec![
        gate("start", ClusterType::Start, 0, 0, 2),
        gate("a", ClusterType::MiniDungeon, 3, 1, 1),
        gate("b", ClusterType::MiniDungeon, 3, 1, 1),
        {
            let mut c: Cluster = gate("boss", ClusterType::FinalBoss, 5, 2, 0);
            c.allow_shared_entrance = true;
            c
        },
    ]);
    let config: GeneratorConfig = GeneratorConfig {
        max_parallel_paths: 2,
        min_layers: 1,
        max_layers: 1,
        requirements: BTreeMap::new(),
        ..GeneratorConfig::default()
    };

    for seed in 0..20 {
        let result = retry::generate(&pool, &config, Some(seed)).unwrap();
        let dag: &Dag = &result.dag;
        assert_eq!(dag.len(), 4);
        assert_eq!(dag.edges().len(), 4);

        let start = dag.node(dag.start()).unwrap();
        assert_eq!(start.cluster, "start");
        let mut middle: Vec<&str> = dag
            .successors(start.id)
            .iter()
            .map(|id| dag.node(*id).unwrap().cluster.as_str())
            .collect();
        middle.sort_unstable();
        assert_eq!(middle, vec!["a", "b"]);

        let boss = dag.node(dag.end().unwrap()).unwrap();
        assert_eq!(boss.cluster, "boss");
        assert!(boss.shared_entrance);
        assert_eq!(boss.entries.len(), 2);
        assert_eq!(boss.entries[0].fog, "boss_in0");
        assert_eq!(boss.entries[1].fog, "boss_in0");
        assert_eq!(result.balance.num_paths, 2);
    }
}

#[test]
fn net_exit_tie_break() {
    let c: Cluster = Cluster::new("keep", ClusterType::LegacyDungeon, 6)
        .with_two_way("keep_bridge")
        .with_entry(FogPoint::one_way("keep_gate"));
    let wiring = compat::wire(&c, Role::PassThrough).unwrap();
    assert_eq!(wiring.entries, vec!["keep_gate".to_string()]);
    assert_eq!(wiring.outgoing, vec!["keep_bridge".to_string()]);
}

#[test]
fn pinned_seed_failure_is_final() {
    let pool: ClusterPool = realistic_pool();
    let config: GeneratorConfig = GeneratorConfig {
        requirements: BTreeMap::from([(ClusterType::LegacyDungeon, 40)]),
        max_attempts: 4,
        ..GeneratorConfig::default()
    };

    match retry::generate(&pool, &config, Some(99)) {
        Err(GenerationError::ValidationFailure { failures }) => {
            assert!(failures.iter().any(|f| f.to_string().starts_with("minimum-content")));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let mut seeds = ChaCha8Rng::seed_from_u64(1);
    match retry::generate_with(&pool, &config, None, &mut seeds) {
        Err(GenerationError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("unexpected result: {other:?}"),
    }
}
