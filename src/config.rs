/*
config.rs

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

//! Run configuration.
//!
//! All the fields have a default value, so that a configuration file only needs to list the
//! parameters it changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::generator::cluster::ClusterType;

pub const COPYRIGHT_NOTICE: &str = "Copyright 2025 Hervé Quatremain
License GPLv3+: GNU GPL version 3 or later <https://gnu.org/licenses/gpl.html>.
This is free software: you are free to change and redistribute it.
There is NO WARRANTY, to the extent permitted by law.";

/// Default number of generation attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Highest difficulty tier, assigned to the final boss.
pub const DEFAULT_FINAL_TIER: u32 = 28;

/// Parameters of the route graph generator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Maximum difference between the heaviest and the lightest path before a budget warning is
    /// reported.
    pub budget_tolerance: u32,

    /// Minimum number of nodes of each cluster type.
    pub requirements: BTreeMap<ClusterType, usize>,

    /// Maximum number of branches in progress at the same time.
    pub max_parallel_paths: usize,

    /// Maximum number of branches created by a split or combined by a merge.
    pub max_branches: usize,

    /// Minimum number of planned layers.
    pub min_layers: usize,

    /// Maximum number of planned layers.
    pub max_layers: usize,

    /// Probability of splitting a branch in a layer.
    pub split_probability: f64,

    /// Probability of merging branches in a layer.
    pub merge_probability: f64,

    /// Cluster type of the first layer, for a consistent opening.
    pub first_layer_type: Option<ClusterType>,

    /// Cluster type used to pad the layer plan.
    pub filler_type: ClusterType,

    /// Probability of replacing a filler layer by a major boss layer.
    pub major_boss_ratio: f64,

    /// Tier of the final boss.
    pub final_tier: u32,

    /// Identifiers of the clusters that can end the graph.
    /// When empty, all the clusters of type [`ClusterType::FinalBoss`] are candidates.
    pub final_boss_candidates: Vec<String>,

    /// Identifier of the start cluster.
    /// When not set, the first cluster of type [`ClusterType::Start`] is used.
    pub start_cluster: Option<String>,

    /// Number of attempts before giving up, when the seed is not pinned.
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            budget_tolerance: 10,
            requirements: BTreeMap::from([
                (ClusterType::LegacyDungeon, 1),
                (ClusterType::MiniDungeon, 2),
                (ClusterType::BossArena, 2),
            ]),
            max_parallel_paths: 3,
            max_branches: 3,
            min_layers: 6,
            max_layers: 10,
            split_probability: 0.3,
            merge_probability: 0.3,
            first_layer_type: None,
            filler_type: ClusterType::MiniDungeon,
            major_boss_ratio: 0.2,
            final_tier: DEFAULT_FINAL_TIER,
            final_boss_candidates: Vec::new(),
            start_cluster: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GeneratorConfig {
    /// Verify that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// The method returns [`GenerationError::InvalidInput`] with the first problem found.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let fail = |msg: String| Err(GenerationError::InvalidInput(msg));

        if self.min_layers == 0 {
            return fail("min_layers must be at least 1".to_string());
        }
        if self.min_layers > self.max_layers {
            return fail(format!(
                "min_layers ({}) is greater than max_layers ({})",
                self.min_layers, self.max_layers
            ));
        }
        if self.max_parallel_paths == 0 {
            return fail("max_parallel_paths must be at least 1".to_string());
        }
        if self.max_branches < 2 {
            return fail("max_branches must be at least 2".to_string());
        }
        for (name, p) in [
            ("split_probability", self.split_probability),
            ("merge_probability", self.merge_probability),
            ("major_boss_ratio", self.major_boss_ratio),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return fail(format!("{name} ({p}) must be between 0 and 1"));
            }
        }
        if self.split_probability + self.merge_probability > 1.0 {
            return fail(format!(
                "split_probability + merge_probability ({}) must not exceed 1",
                self.split_probability + self.merge_probability
            ));
        }
        if self.final_tier == 0 {
            return fail("final_tier must be at least 1".to_string());
        }
        if self.filler_type.is_reserved() {
            return fail(format!("filler_type cannot be {}", self.filler_type));
        }
        if let Some(t) = self.first_layer_type
            && t.is_reserved()
        {
            return fail(format!("first_layer_type cannot be {t}"));
        }
        if self.max_attempts == 0 {
            return fail("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
