/*
planner.rs

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

//! Plan the cluster type and the tier of each layer before building the graph.

use log::{Level, debug, log_enabled};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::cluster::ClusterType;
use crate::config::GeneratorConfig;

/// Planned content of one layer.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    /// Preferred cluster type for the nodes of the layer.
    pub cluster_type: ClusterType,

    /// Difficulty tier of the layer.
    pub tier: u32,
}

/// Ordered list of the planned layers.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LayerPlan {
    layers: Vec<LayerSpec>,
}

/// Tier of the given layer: linear interpolation from 1 for the first layer to `final_tier` for
/// the last one.
pub fn tier_for_layer(layer: usize, num_layers: usize, final_tier: u32) -> u32 {
    if num_layers <= 1 || final_tier <= 1 {
        return 1;
    }
    let ratio: f64 = layer as f64 / (num_layers - 1) as f64;
    let tier: f64 = (1.0 + ratio * (final_tier - 1) as f64).round();
    (tier as u32).clamp(1, final_tier)
}

impl LayerPlan {
    /// Create a [`LayerPlan`] object from an explicit list of cluster types.
    pub fn from_types(types: &[ClusterType], final_tier: u32) -> Self {
        let n: usize = types.len();
        Self {
            layers: types
                .iter()
                .enumerate()
                .map(|(i, t)| LayerSpec {
                    cluster_type: *t,
                    tier: tier_for_layer(i, n, final_tier),
                })
                .collect(),
        }
    }

    /// Build a random layer plan.
    ///
    /// The number of layers is drawn from `[min_layers, max_layers]`.
    /// The plan starts with the required cluster types, is padded (or trimmed) with the filler
    /// type, gets some filler layers replaced by major bosses, and is then shuffled.
    pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Self {
        let num_layers: usize = rng.random_range(config.min_layers..=config.max_layers);

        let mut types: Vec<ClusterType> = Vec::with_capacity(num_layers);
        for (t, count) in &config.requirements {
            types.extend(std::iter::repeat_n(*t, *count));
        }
        if types.len() > num_layers {
            debug!(
                "Trimming the plan: {} required layers for {num_layers} layers",
                types.len()
            );
        }
        types.resize(num_layers, config.filler_type);

        for t in types.iter_mut() {
            if *t == config.filler_type && rng.random_bool(config.major_boss_ratio) {
                *t = ClusterType::MajorBoss;
            }
        }
        types.shuffle(rng);

        // Use the forced type for the first layer, by moving an already planned layer of that type
        // if any
        if let Some(first) = config.first_layer_type {
            match types.iter().position(|t| *t == first) {
                Some(pos) => types.swap(0, pos),
                None => types[0] = first,
            }
        }

        let plan: LayerPlan = Self::from_types(&types, config.final_tier);
        if log_enabled!(Level::Debug) {
            for (i, l) in plan.layers.iter().enumerate() {
                debug!("Planned layer {i}: {} (tier {})", l.cluster_type, l.tier);
            }
        }
        plan
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Tier of the last planned layer.
    pub fn last_tier(&self) -> u32 {
        self.layers.last().map_or(1, |l| l.tier)
    }
}
