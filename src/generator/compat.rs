/*
compat.rs

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

//! Decide whether a cluster can play a topological role, and which fog gates it consumes.
//!
//! One-way entries are always consumed before bidirectional entries, because a bidirectional
//! entry also removes one exit from the cluster.

use std::collections::HashSet;

use super::cluster::{Cluster, ClusterType, FogPoint};

/// Topological role of a cluster in one layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    /// One branch in, one branch out.
    PassThrough,

    /// One branch in, the given number of branches out.
    Split(usize),

    /// The given number of branches in, one branch out.
    Merge(usize),
}

/// Fog gates used by a node for its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiring {
    /// Entry fog gate for each incoming branch, in branch order.
    /// With shared entrance, the same entry is repeated.
    pub entries: Vec<String>,

    /// Whether several incoming branches share one entry fog gate.
    pub shared: bool,

    /// Exit fog gates reserved for the outgoing branches.
    pub outgoing: Vec<String>,

    /// Exit fog gates left unused.
    pub spare: Vec<String>,
}

/// Number of exits left after `num_entries` entries have been consumed.
pub fn net_exits(cluster: &Cluster, num_entries: usize) -> usize {
    let one_way: usize = cluster.num_one_way_entries();
    let two_way: usize = cluster.num_two_way_entries();
    let two_way_used: usize = num_entries.saturating_sub(one_way).min(two_way);
    cluster.exits.len().saturating_sub(two_way_used)
}

/// Whether the entry-as-exit relaxation applies to the cluster.
///
/// Only single-room boss arenas qualify.
pub fn uses_entry_as_exit(cluster: &Cluster) -> bool {
    cluster.allow_entry_as_exit && cluster.cluster_type == ClusterType::BossArena
}

/// Whether the shared entrance relaxation applies to the cluster.
///
/// Clusters with a single entrance never qualify.
pub fn uses_shared_entrance(cluster: &Cluster) -> bool {
    cluster.allow_shared_entrance && cluster.entries.len() >= 2
}

/// Whether the cluster can continue a single branch.
pub fn can_pass_through(cluster: &Cluster) -> bool {
    if uses_entry_as_exit(cluster) {
        return !cluster.entries.is_empty() && !cluster.exits.is_empty();
    }
    !cluster.entries.is_empty() && net_exits(cluster, 1) == 1
}

/// Whether the cluster can split one branch into `n` branches.
pub fn can_split(cluster: &Cluster, n: usize) -> bool {
    if uses_entry_as_exit(cluster) {
        return !cluster.entries.is_empty() && cluster.exits.len() >= n;
    }
    !cluster.entries.is_empty() && net_exits(cluster, 1) == n
}

/// Whether the cluster can merge `n` branches into one.
pub fn can_merge(cluster: &Cluster, n: usize) -> bool {
    if cluster.entries.len() >= n && net_exits(cluster, n) == 1 {
        return true;
    }
    uses_shared_entrance(cluster) && !cluster.exits.is_empty() && net_exits(cluster, 1) >= 1
}

/// Whether the cluster can play the given role.
pub fn is_eligible(cluster: &Cluster, role: Role) -> bool {
    match role {
        Role::PassThrough => can_pass_through(cluster),
        Role::Split(n) => can_split(cluster, n),
        Role::Merge(n) => can_merge(cluster, n),
    }
}

/// Entries in consumption order: one-way entries first, then bidirectional entries.
pub fn preferred_entries(cluster: &Cluster) -> Vec<&FogPoint> {
    let mut entries: Vec<&FogPoint> = cluster.entries.iter().collect();
    entries.sort_by_key(|f| f.bidirectional);
    entries
}

/// Exits still available once the given entries are consumed.
///
/// With entry-as-exit, no exit is removed, but the exit sides of the consumed entries come last
/// so that they are only used when needed.
pub fn remaining_exits<'a>(cluster: &'a Cluster, consumed: &[&FogPoint]) -> Vec<&'a FogPoint> {
    let consumed_ids: HashSet<&str> = consumed
        .iter()
        .filter(|f| f.bidirectional)
        .map(|f| f.id.as_str())
        .collect();

    if uses_entry_as_exit(cluster) {
        let mut exits: Vec<&FogPoint> = cluster.exits.iter().collect();
        exits.sort_by_key(|f| consumed_ids.contains(f.id.as_str()));
        return exits;
    }
    cluster
        .exits
        .iter()
        .filter(|f| !consumed_ids.contains(f.id.as_str()))
        .collect()
}

/// Return the fog gates the cluster uses for the given role, or `None` if the cluster is not
/// eligible.
pub fn wire(cluster: &Cluster, role: Role) -> Option<Wiring> {
    if !is_eligible(cluster, role) {
        return None;
    }
    let preferred: Vec<&FogPoint> = preferred_entries(cluster);

    let (consumed, entries, shared, num_out): (Vec<&FogPoint>, Vec<String>, bool, usize) =
        match role {
            Role::PassThrough | Role::Split(_) => {
                let entry: &FogPoint = preferred.first().copied()?;
                let num_out: usize = match role {
                    Role::Split(n) => n,
                    _ => 1,
                };
                (vec![entry], vec![entry.id.clone()], false, num_out)
            }
            Role::Merge(n) => {
                if cluster.entries.len() >= n && net_exits(cluster, n) == 1 {
                    let consumed: Vec<&FogPoint> = preferred.iter().take(n).copied().collect();
                    let entries: Vec<String> = consumed.iter().map(|f| f.id.clone()).collect();
                    (consumed, entries, false, 1)
                } else {
                    let entry: &FogPoint = preferred.first().copied()?;
                    (vec![entry], vec![entry.id.clone(); n], true, 1)
                }
            }
        };

    let exits: Vec<&FogPoint> = remaining_exits(cluster, &consumed);
    if exits.len() < num_out {
        return None;
    }
    let (outgoing, spare) = exits.split_at(num_out);
    Some(Wiring {
        entries,
        shared,
        outgoing: outgoing.iter().map(|f| f.id.clone()).collect(),
        spare: spare.iter().map(|f| f.id.clone()).collect(),
    })
}

/// Return the fog gates a final boss uses to receive `n` branches, or `None` if it cannot.
///
/// The canonical entry is used first. Several branches can only end at the final boss together
/// when it allows shared entrance. Otherwise the branches must be merged down to one before.
pub fn wire_terminal(cluster: &Cluster, n: usize) -> Option<Wiring> {
    let mut preferred: Vec<&FogPoint> = preferred_entries(cluster);
    preferred.sort_by_key(|f| !f.canonical);
    let first: &FogPoint = preferred.first().copied()?;

    let (entries, shared): (Vec<String>, bool) = if n <= 1 {
        (vec![first.id.clone()], false)
    } else if uses_shared_entrance(cluster) {
        (vec![first.id.clone(); n], true)
    } else {
        return None;
    };
    Some(Wiring {
        entries,
        shared,
        outgoing: Vec::new(),
        spare: Vec::new(),
    })
}
