/*
spoiler.rs

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

//! Human-readable description of a generated route graph.
//!
//! # Examples
//!
//! ```text
//! Fogdag spoiler log
//! Seed: 42
//! Generated: 2025-06-01 18:02:11
//! Attempts: 1
//!
//! Layer 0 (tier 1): chapel [start, weight 0]
//! Layer 1 (tier 1): stormveil [legacy_dungeon, weight 6]
//! ...
//!
//! Paths (2):
//!    27  chapel > stormveil > ... > erdtree
//!    31  chapel > stormveil > ... > erdtree
//!
//! Spread: 4 (min 27, max 31)
//! ```

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt::Write;

use super::dag::{DagNode, NodeId};
use super::retry::GenerationResult;

/// Return the spoiler log of the given result.
pub fn render(result: &GenerationResult, generated_at: DateTime<Local>) -> String {
    let mut out: String = String::new();
    let dag = &result.dag;

    // Writing to a String cannot fail
    let _ = writeln!(out, "Fogdag spoiler log");
    let _ = writeln!(out, "Seed: {}", result.seed);
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Attempts: {}", result.attempts);
    let _ = writeln!(out);

    let mut layers: BTreeMap<usize, Vec<&DagNode>> = BTreeMap::new();
    for node in dag.nodes() {
        layers.entry(node.layer).or_default().push(node);
    }
    for (layer, nodes) in &layers {
        let tier: u32 = nodes.first().map_or(1, |n| n.tier);
        let list: Vec<String> = nodes
            .iter()
            .map(|n| {
                format!(
                    "{} [{}, weight {}{}]",
                    n.cluster,
                    n.cluster_type,
                    n.weight,
                    if n.shared_entrance { ", shared entrance" } else { "" }
                )
            })
            .collect();
        let _ = writeln!(out, "Layer {layer} (tier {tier}): {}", list.join(", "));
    }

    let balance = &result.balance;
    let _ = writeln!(out);
    if balance.paths.len() < balance.num_paths {
        let _ = writeln!(
            out,
            "Paths ({}, first {} listed):",
            balance.num_paths,
            balance.paths.len()
        );
    } else {
        let _ = writeln!(out, "Paths ({}):", balance.num_paths);
    }
    let name = |id: &NodeId| dag.node(*id).map_or("?", |n| n.cluster.as_str());
    for p in &balance.paths {
        let names: Vec<&str> = p.nodes.iter().map(name).collect();
        let _ = writeln!(out, "  {:>4}  {}", p.weight, names.join(" > "));
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Spread: {} (min {}, max {})",
        balance.spread, balance.min_weight, balance.max_weight
    );
    for w in &result.warnings {
        let _ = writeln!(out, "Warning: {w}");
    }
    out
}
