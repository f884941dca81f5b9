/*
builder.rs

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

//! Build a route graph layer by layer.
//!
//! The [`Generator`] object starts with one branch per exit of the start cluster (up to the
//! maximum number of parallel paths).
//! For each planned layer, it randomly chooses an operation:
//!
//! * pass-through: every branch goes through a new cluster.
//! * split: one branch goes through a cluster with several exits and becomes several branches.
//!   The other branches pass through.
//! * merge: several branches enter the same cluster and become one branch.
//!   The other branches pass through.
//!
//! When the planned layers are exhausted, the remaining branches are merged until a final boss
//! can receive all of them.
//! If a required cluster cannot be found, then the whole attempt fails. The retry driver (see
//! [`super::retry`]) then starts a new attempt with another seed.

use log::{Level, debug, log_enabled};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::HashSet;
use strum_macros::Display;

use super::cluster::{Cluster, ClusterPool, ClusterType, PoolRoles};
use super::compat::{self, Role, Wiring};
use super::dag::{Branch, BranchId, Dag, NodeId, is_micro_merge};
use super::planner::{LayerPlan, LayerSpec};
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};

// Maximum number of layers added after the planned layers to converge the branches.
const MAX_CONVERGE_LAYERS: usize = 12;

/// State of the generator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum BuildState {
    Building,
    Converging,
    Done,
    Failed,
}

/// Operation applied to a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    PassThrough,
    Split,
    Merge,
    Terminal,
}

/// How to choose the number of branches to merge.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MergeSize {
    /// Any size for which a cluster exists.
    Random,

    /// The largest size for which a cluster exists.
    Largest,
}

/// [`Generator`] object.
pub struct Generator<'a, R: Rng + ?Sized> {
    pool: &'a ClusterPool,
    roles: &'a PoolRoles<'a>,
    config: &'a GeneratorConfig,
    plan: &'a LayerPlan,
    rng: &'a mut R,

    /// Graph under construction.
    dag: Dag,

    /// Branches in progress.
    branches: Vec<Branch>,

    /// Every branch created so far, in creation order.
    lineage: Vec<Branch>,

    /// Clusters already placed in the graph.
    used: HashSet<String>,

    state: BuildState,

    /// Layer of the nodes being placed.
    layer: usize,

    /// Tier of the nodes being placed.
    tier: u32,
}

impl<'a, R: Rng + ?Sized> Generator<'a, R> {
    /// Create the object.
    pub fn new(
        pool: &'a ClusterPool,
        roles: &'a PoolRoles<'a>,
        config: &'a GeneratorConfig,
        plan: &'a LayerPlan,
        rng: &'a mut R,
    ) -> Self {
        Self {
            pool,
            roles,
            config,
            plan,
            rng,
            dag: Dag::new(),
            branches: Vec::with_capacity(config.max_parallel_paths),
            lineage: Vec::new(),
            used: HashSet::with_capacity(pool.len()),
            state: BuildState::Building,
            layer: 0,
            tier: 1,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    /// Every branch created during the construction, in creation order.
    pub fn lineage(&self) -> &[Branch] {
        &self.lineage
    }

    /// Return the graph.
    pub fn into_dag(self) -> Dag {
        self.dag
    }

    /// Build the graph.
    ///
    /// # Errors
    ///
    /// The method returns [`GenerationError::GenerationFailure`] when no cluster can be found for
    /// a required operation. The state is then [`BuildState::Failed`].
    pub fn build(&mut self) -> Result<()> {
        let res: Result<()> = self.run();
        self.state = match res {
            Ok(()) => BuildState::Done,
            Err(_) => BuildState::Failed,
        };
        res
    }

    fn run(&mut self) -> Result<()> {
        self.state = BuildState::Building;
        self.seed_start();

        let plan: &LayerPlan = self.plan;
        for (i, spec) in plan.layers().iter().enumerate() {
            self.layer = i + 1;
            self.tier = spec.tier;
            self.step(spec, plan.len() - i)?;
        }

        self.state = BuildState::Converging;
        self.converge()?;
        self.terminate()
    }

    /// Place the start node and create its branches.
    ///
    /// The number of branches is also limited to one more than the number of planned layers:
    /// branches leaving the start must reach distinct nodes before they can merge, and each
    /// planned layer merges at most once.
    fn seed_start(&mut self) {
        let start: &'a Cluster = self.roles.start;
        let mut exits: Vec<String> = start.exits.iter().map(|f| f.id.clone()).collect();
        exits.shuffle(&mut *self.rng);

        let node: NodeId = self.dag.add_node(start, 0, 1, exits.clone());
        self.dag.set_start(node);
        self.used.insert(start.id.clone());

        let num_branches: usize = exits
            .len()
            .min(self.config.max_parallel_paths)
            .min(self.plan.len() + 1);
        for exit in exits.into_iter().take(num_branches) {
            let branch: Branch = self.new_branch(Vec::new(), node, exit);
            self.branches.push(branch);
        }
        debug!(
            "Start {} with {} branches",
            start.id,
            self.branches.len()
        );
    }

    /// Create a branch and record it in the lineage.
    fn new_branch(&mut self, parents: Vec<BranchId>, node: NodeId, exit: String) -> Branch {
        let branch: Branch = Branch {
            id: self.lineage.len(),
            parents,
            node,
            exit,
        };
        self.lineage.push(branch.clone());
        branch
    }

    /// Choose the operation for a planned layer.
    ///
    /// `remaining` is the number of planned layers left, the current one included.
    fn choose_operation(&mut self, remaining: usize) -> Operation {
        let b: usize = self.branches.len();
        let split_p: f64 = self.config.split_probability;
        let merge_p: f64 = self.config.merge_probability;
        let roll: f64 = self.rng.random();

        if remaining <= 2 && b > 1 {
            return Operation::Merge;
        }
        if b >= self.config.max_parallel_paths {
            if b > 1 && roll < merge_p {
                Operation::Merge
            } else {
                Operation::PassThrough
            }
        } else if b == 1 {
            if roll < split_p {
                Operation::Split
            } else {
                Operation::PassThrough
            }
        } else if roll < split_p {
            Operation::Split
        } else if roll < split_p + merge_p {
            Operation::Merge
        } else {
            Operation::PassThrough
        }
    }

    /// Grow the graph by one planned layer.
    fn step(&mut self, spec: &LayerSpec, remaining: usize) -> Result<()> {
        let op: Operation = self.choose_operation(remaining);
        debug!(
            "Layer {} ({}, tier {}): {} branches, {op}",
            self.layer,
            spec.cluster_type,
            spec.tier,
            self.branches.len()
        );
        let done: bool = match op {
            Operation::Split => self.split(Some(spec.cluster_type))?,
            Operation::Merge => self.merge(Some(spec.cluster_type), MergeSize::Random)?,
            _ => false,
        };
        if !done {
            if op != Operation::PassThrough {
                debug!("    {op} not possible, passing through");
            }
            let branches: Vec<Branch> = std::mem::take(&mut self.branches);
            self.branches = self.pass_through(branches, Some(spec.cluster_type))?;
        }
        Ok(())
    }

    /// Merge the branches after the planned layers, until a final boss can receive them.
    fn converge(&mut self) -> Result<()> {
        let mut extra: usize = 0;
        self.tier = self.plan.last_tier();

        while self.branches.len() > 1 && !self.terminal_accepts_all() {
            if extra >= MAX_CONVERGE_LAYERS {
                return Err(self.failure(
                    Operation::Merge,
                    format!(
                        "{} branches left after {MAX_CONVERGE_LAYERS} extra layers",
                        self.branches.len()
                    ),
                ));
            }
            extra += 1;
            self.layer += 1;

            let refs: Vec<&Branch> = self.branches.iter().collect();
            if is_micro_merge(&refs) {
                // All the branches come out of the same node: separate them first
                debug!("Layer {}: diverging {} branches", self.layer, refs.len());
                let branches: Vec<Branch> = std::mem::take(&mut self.branches);
                self.branches = self.pass_through(branches, None)?;
                continue;
            }

            debug!(
                "Layer {}: converging {} branches",
                self.layer,
                self.branches.len()
            );
            if !self.merge(None, MergeSize::Largest)? {
                return Err(self.failure(
                    Operation::Merge,
                    format!("no cluster can merge {} branches", self.branches.len()),
                ));
            }
        }
        Ok(())
    }

    /// Connect the remaining branches to a final boss.
    fn terminate(&mut self) -> Result<()> {
        let n: usize = self.branches.len();
        let candidates: Vec<(&'a Cluster, Wiring)> = self
            .roles
            .final_bosses
            .iter()
            .filter(|c| !self.used.contains(&c.id))
            .filter_map(|c| compat::wire_terminal(c, n).map(|w| (*c, w)))
            .collect();

        let (cluster, wiring) = match candidates.choose(&mut *self.rng) {
            Some((c, w)) => (*c, w.clone()),
            None => {
                return Err(self.failure(
                    Operation::Terminal,
                    format!("no final boss can receive {n} branches"),
                ));
            }
        };

        self.layer += 1;
        self.tier = self.config.final_tier;
        let branches: Vec<Branch> = std::mem::take(&mut self.branches);
        let node: NodeId = self.place(cluster, &wiring, &branches);
        self.dag.set_end(node);
        debug!(
            "Layer {}: final boss {} receives {n} branches",
            self.layer, cluster.id
        );
        Ok(())
    }

    /// Whether a final boss can receive all the branches now, without duplicate edges.
    fn terminal_accepts_all(&self) -> bool {
        let n: usize = self.branches.len();
        let nodes: HashSet<NodeId> = self.branches.iter().map(|b| b.node).collect();
        if nodes.len() != n {
            return false;
        }
        self.roles
            .final_bosses
            .iter()
            .any(|c| !self.used.contains(&c.id) && compat::wire_terminal(c, n).is_some())
    }

    /// Move each of the given branches through a new pass-through cluster.
    fn pass_through(
        &mut self,
        branches: Vec<Branch>,
        preferred: Option<ClusterType>,
    ) -> Result<Vec<Branch>> {
        let mut next: Vec<Branch> = Vec::with_capacity(branches.len());

        for mut branch in branches {
            let (cluster, wiring) = match self.pick_cluster(preferred, Role::PassThrough) {
                Some(found) => found,
                None => {
                    return Err(self.failure(
                        Operation::PassThrough,
                        "no pass-through cluster left".to_string(),
                    ));
                }
            };
            let node: NodeId = self.place(cluster, &wiring, std::slice::from_ref(&branch));
            debug!("    Branch {}: {}", branch.id, cluster.id);

            // The branch keeps its identity and moves forward
            branch.node = node;
            branch.exit = wiring.outgoing[0].clone();
            next.push(branch);
        }
        Ok(next)
    }

    /// Try to split a random branch. The other branches pass through.
    ///
    /// Return `false` if no cluster can split the branch.
    fn split(&mut self, preferred: Option<ClusterType>) -> Result<bool> {
        let b: usize = self.branches.len();
        let max_n: usize = self
            .config
            .max_branches
            .min((self.config.max_parallel_paths + 1).saturating_sub(b));
        if b == 0 || max_n < 2 {
            return Ok(false);
        }

        // Largest split first
        let mut found: Option<(&'a Cluster, Wiring)> = None;
        for n in (2..=max_n).rev() {
            found = self.pick_cluster(preferred, Role::Split(n));
            if found.is_some() {
                break;
            }
        }
        let (cluster, wiring) = match found {
            Some(f) => f,
            None => return Ok(false),
        };

        let idx: usize = self.rng.random_range(0..b);
        let parent: Branch = self.branches.remove(idx);
        let others: Vec<Branch> = std::mem::take(&mut self.branches);

        let node: NodeId = self.place(cluster, &wiring, std::slice::from_ref(&parent));
        let children: Vec<Branch> = wiring
            .outgoing
            .iter()
            .map(|exit| self.new_branch(vec![parent.id], node, exit.clone()))
            .collect();
        debug!(
            "    Branch {} splits into {} through {}",
            parent.id,
            children.len(),
            cluster.id
        );

        let mut next: Vec<Branch> = self.pass_through(others, preferred)?;
        let pos: usize = idx.min(next.len());
        next.splice(pos..pos, children);
        self.branches = next;
        Ok(true)
    }

    /// Try to merge some branches. The other branches pass through.
    ///
    /// Return `false` if no cluster can merge the branches, or if the only possible merge would
    /// combine branches coming out of the same node.
    fn merge(&mut self, preferred: Option<ClusterType>, size: MergeSize) -> Result<bool> {
        let distinct: HashSet<NodeId> = self.branches.iter().map(|b| b.node).collect();
        let max_n: usize = self.config.max_branches.min(distinct.len());
        if max_n < 2 {
            debug!("    No merge: all the branches come out of the same node");
            return Ok(false);
        }

        let sizes: Vec<usize> = (2..=max_n)
            .filter(|n| self.has_candidate(Role::Merge(*n)))
            .collect();
        let n: usize = match size {
            MergeSize::Random => sizes.choose(&mut *self.rng).copied(),
            MergeSize::Largest => sizes.last().copied(),
        }
        .unwrap_or(0);
        if n < 2 {
            return Ok(false);
        }

        let mut picked: Vec<usize> = match self.select_merge_set(n) {
            Some(p) => p,
            None => return Ok(false),
        };
        let (cluster, wiring) = match self.pick_cluster(preferred, Role::Merge(n)) {
            Some(f) => f,
            None => return Ok(false),
        };

        // Extract the merged branches, keeping the other ones in order
        picked.sort_unstable();
        let pos: usize = picked[0];
        let mut merged: Vec<Branch> = Vec::with_capacity(n);
        for i in picked.iter().rev() {
            merged.push(self.branches.remove(*i));
        }
        merged.reverse();
        let others: Vec<Branch> = std::mem::take(&mut self.branches);

        let node: NodeId = self.place(cluster, &wiring, &merged);
        let parents: Vec<BranchId> = merged.iter().map(|b| b.id).collect();
        debug!(
            "    Branches {parents:?} merge through {}{}",
            cluster.id,
            if wiring.shared { " (shared entrance)" } else { "" }
        );
        let child: Branch = self.new_branch(parents, node, wiring.outgoing[0].clone());

        let mut next: Vec<Branch> = self.pass_through(others, preferred)?;
        next.insert(pos.min(next.len()), child);
        self.branches = next;
        Ok(true)
    }

    /// Randomly select `n` branches that all end at different nodes.
    ///
    /// Branches ending at the same node would produce duplicate edges, and merging only such
    /// branches would undo a split.
    fn select_merge_set(&mut self, n: usize) -> Option<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.branches.len()).collect();
        order.shuffle(&mut *self.rng);

        let mut nodes: HashSet<NodeId> = HashSet::with_capacity(n);
        let mut picked: Vec<usize> = Vec::with_capacity(n);
        for i in order {
            if nodes.insert(self.branches[i].node) {
                picked.push(i);
                if picked.len() == n {
                    break;
                }
            }
        }
        if picked.len() < n {
            return None;
        }
        let selection: Vec<&Branch> = picked.iter().map(|i| &self.branches[*i]).collect();
        if is_micro_merge(&selection) {
            return None;
        }
        Some(picked)
    }

    /// Whether an unused cluster can play the role, whatever its type.
    fn has_candidate(&self, role: Role) -> bool {
        self.pool
            .clusters()
            .iter()
            .any(|c| self.is_available(c) && compat::is_eligible(c, role))
    }

    fn is_available(&self, cluster: &Cluster) -> bool {
        !self.used.contains(&cluster.id) && !self.roles.is_reserved(cluster)
    }

    /// Randomly select an unused cluster for the role, of the preferred type if possible.
    fn pick_cluster(
        &mut self,
        preferred: Option<ClusterType>,
        role: Role,
    ) -> Option<(&'a Cluster, Wiring)> {
        let pool: &'a ClusterPool = self.pool;
        let eligible: Vec<(&'a Cluster, Wiring)> = pool
            .clusters()
            .iter()
            .filter(|c| self.is_available(c))
            .filter_map(|c| compat::wire(c, role).map(|w| (c, w)))
            .collect();

        if let Some(t) = preferred {
            let typed: Vec<&(&'a Cluster, Wiring)> =
                eligible.iter().filter(|(c, _)| c.cluster_type == t).collect();
            if let Some(found) = typed.choose(&mut *self.rng) {
                return Some((found.0, found.1.clone()));
            }
            if log_enabled!(Level::Debug) && !eligible.is_empty() {
                debug!("    No {t} cluster for {role:?}, using another type");
            }
        }
        eligible.choose(&mut *self.rng).map(|(c, w)| (*c, w.clone()))
    }

    /// Add a node for the cluster and connect the incoming branches to it.
    fn place(&mut self, cluster: &Cluster, wiring: &Wiring, incoming: &[Branch]) -> NodeId {
        let mut open_exits: Vec<String> = wiring.outgoing.clone();
        open_exits.extend(wiring.spare.iter().cloned());

        let node: NodeId = self.dag.add_node(cluster, self.layer, self.tier, open_exits);
        for (branch, entry) in incoming.iter().zip(wiring.entries.iter()) {
            self.dag.connect(branch.node, &branch.exit, node, entry);
        }
        self.dag.set_shared_entrance(node, wiring.shared);
        self.used.insert(cluster.id.clone());
        node
    }

    fn failure(&self, operation: Operation, reason: String) -> GenerationError {
        debug!("Layer {}: {operation} failed: {reason}", self.layer);
        GenerationError::GenerationFailure {
            layer: self.layer,
            operation,
            reason,
        }
    }
}
