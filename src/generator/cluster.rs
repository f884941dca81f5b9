/*
cluster.rs

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

//! Clusters and the cluster pool.
//!
//! A [`Cluster`] is a group of zones that the player can cross as a unit.
//! The player enters and leaves a cluster through fog gates, represented by [`FogPoint`] objects.
//! The [`ClusterPool`] is the read-only catalog of clusters that the generator draws from.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::config::GeneratorConfig;
use crate::error::GenerationError;

/// Cluster type.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    ValueEnum,
    Display,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClusterType {
    Start,
    BossArena,
    #[default]
    MiniDungeon,
    LegacyDungeon,
    MajorBoss,
    FinalBoss,
}

impl ClusterType {
    /// Whether clusters of this type never appear as intermediate nodes.
    pub fn is_reserved(self) -> bool {
        matches!(self, ClusterType::Start | ClusterType::FinalBoss)
    }
}

/// Fog gate (connection point) of a cluster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FogPoint {
    /// Fog gate identifier, unique in the cluster.
    pub id: String,

    /// Whether the same physical fog gate is listed in both the entries and the exits of the
    /// cluster. Using it in one direction makes it unavailable in the other direction.
    #[serde(default)]
    pub bidirectional: bool,

    /// Whether the fog gate is the canonical entrance of the cluster. Only used for the final boss.
    #[serde(default)]
    pub canonical: bool,
}

impl FogPoint {
    /// Create a one-way [`FogPoint`].
    pub fn one_way(id: &str) -> Self {
        Self {
            id: id.to_string(),
            bidirectional: false,
            canonical: false,
        }
    }

    /// Create a bidirectional [`FogPoint`].
    pub fn two_way(id: &str) -> Self {
        Self {
            id: id.to_string(),
            bidirectional: true,
            canonical: false,
        }
    }
}

/// Reusable building block of the route graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster identifier.
    pub id: String,

    /// Zones grouped in the cluster.
    #[serde(default)]
    pub zones: Vec<String>,

    /// Type of the cluster.
    #[serde(rename = "type")]
    pub cluster_type: ClusterType,

    /// Traversal-time cost.
    #[serde(default)]
    pub weight: u32,

    /// Fog gates the player can use to enter the cluster.
    #[serde(default)]
    pub entries: Vec<FogPoint>,

    /// Fog gates the player can use to leave the cluster.
    #[serde(default)]
    pub exits: Vec<FogPoint>,

    /// Allow several incoming branches to share the same entry fog gate.
    #[serde(default)]
    pub allow_shared_entrance: bool,

    /// Allow the exit side of a consumed bidirectional entry to stay available.
    #[serde(default)]
    pub allow_entry_as_exit: bool,
}

impl Cluster {
    /// Create a [`Cluster`] object without fog gates.
    pub fn new(id: &str, cluster_type: ClusterType, weight: u32) -> Self {
        Self {
            id: id.to_string(),
            zones: vec![id.to_string()],
            cluster_type,
            weight,
            entries: Vec::new(),
            exits: Vec::new(),
            allow_shared_entrance: false,
            allow_entry_as_exit: false,
        }
    }

    /// Add an entry fog gate.
    pub fn with_entry(mut self, fog: FogPoint) -> Self {
        self.entries.push(fog);
        self
    }

    /// Add an exit fog gate.
    pub fn with_exit(mut self, fog: FogPoint) -> Self {
        self.exits.push(fog);
        self
    }

    /// Add a bidirectional fog gate, which is listed in both the entries and the exits.
    pub fn with_two_way(mut self, id: &str) -> Self {
        self.entries.push(FogPoint::two_way(id));
        self.exits.push(FogPoint::two_way(id));
        self
    }

    /// Number of bidirectional entries.
    pub fn num_two_way_entries(&self) -> usize {
        self.entries.iter().filter(|f| f.bidirectional).count()
    }

    /// Number of one-way entries.
    pub fn num_one_way_entries(&self) -> usize {
        self.entries.len() - self.num_two_way_entries()
    }
}

/// Clusters playing a fixed role in every generated graph.
#[derive(Debug, Clone)]
pub struct PoolRoles<'a> {
    /// Cluster at the root of the graph.
    pub start: &'a Cluster,

    /// Clusters that can terminate the graph.
    pub final_bosses: Vec<&'a Cluster>,
}

impl PoolRoles<'_> {
    /// Whether the cluster is the start or a final boss candidate, and therefore must not be used
    /// in the middle of the graph.
    pub fn is_reserved(&self, cluster: &Cluster) -> bool {
        cluster.cluster_type.is_reserved()
            || cluster.id == self.start.id
            || self.final_bosses.iter().any(|c| c.id == cluster.id)
    }
}

/// Read-only catalog of clusters.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClusterPool {
    clusters: Vec<Cluster>,
}

impl ClusterPool {
    /// Create a [`ClusterPool`] object.
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Return all the clusters in catalog order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters in the pool.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Return the cluster with the given identifier.
    pub fn get(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Resolve the start cluster and the final boss candidates for the given configuration.
    ///
    /// # Errors
    ///
    /// The method returns [`GenerationError::InvalidInput`] if the start cluster is missing or has
    /// no exit, or if no final boss candidate with at least one entry is available.
    pub fn resolve_roles(
        &self,
        config: &GeneratorConfig,
    ) -> Result<PoolRoles<'_>, GenerationError> {
        let start: &Cluster = match &config.start_cluster {
            Some(id) => self.get(id).ok_or_else(|| {
                GenerationError::InvalidInput(format!("start cluster {id} is not in the pool"))
            })?,
            None => self
                .clusters
                .iter()
                .find(|c| c.cluster_type == ClusterType::Start)
                .ok_or_else(|| {
                    GenerationError::InvalidInput("the pool has no start cluster".to_string())
                })?,
        };
        if start.exits.is_empty() {
            return Err(GenerationError::InvalidInput(format!(
                "start cluster {} has no exit",
                start.id
            )));
        }

        let mut final_bosses: Vec<&Cluster> = Vec::new();
        if config.final_boss_candidates.is_empty() {
            final_bosses.extend(
                self.clusters
                    .iter()
                    .filter(|c| c.cluster_type == ClusterType::FinalBoss),
            );
        } else {
            for id in &config.final_boss_candidates {
                match self.get(id) {
                    Some(c) => final_bosses.push(c),
                    None => {
                        return Err(GenerationError::InvalidInput(format!(
                            "final boss candidate {id} is not in the pool"
                        )));
                    }
                }
            }
        }
        final_bosses.retain(|c| !c.entries.is_empty() && c.id != start.id);
        if final_bosses.is_empty() {
            return Err(GenerationError::InvalidInput(
                "the pool has no usable final boss candidate".to_string(),
            ));
        }

        Ok(PoolRoles {
            start,
            final_bosses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ClusterPool {
        ClusterPool::new(vec![
            Cluster::new("chapel", ClusterType::Start, 1)
                .with_exit(FogPoint::one_way("chapel_exit")),
            Cluster::new("stormveil", ClusterType::LegacyDungeon, 12)
                .with_entry(FogPoint::one_way("gate"))
                .with_exit(FogPoint::one_way("rampart")),
            Cluster::new("radagon", ClusterType::FinalBoss, 5)
                .with_entry(FogPoint::one_way("erdtree")),
            Cluster::new("maliketh", ClusterType::MajorBoss, 5)
                .with_entry(FogPoint::one_way("temple")),
        ])
    }

    #[test]
    fn roles_default_to_cluster_types() {
        let pool = pool();
        let roles = pool.resolve_roles(&GeneratorConfig::default()).unwrap();
        assert_eq!(roles.start.id, "chapel");
        assert_eq!(roles.final_bosses.len(), 1);
        assert_eq!(roles.final_bosses[0].id, "radagon");
        assert!(roles.is_reserved(pool.get("radagon").unwrap()));
        assert!(!roles.is_reserved(pool.get("stormveil").unwrap()));
    }

    #[test]
    fn configured_final_boss_is_reserved() {
        let pool = pool();
        let config = GeneratorConfig {
            final_boss_candidates: vec!["maliketh".to_string()],
            ..GeneratorConfig::default()
        };
        let roles = pool.resolve_roles(&config).unwrap();
        assert_eq!(roles.final_bosses[0].id, "maliketh");
        assert!(roles.is_reserved(pool.get("maliketh").unwrap()));
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let pool = pool();
        let config = GeneratorConfig {
            final_boss_candidates: vec!["placidusax".to_string()],
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            pool.resolve_roles(&config),
            Err(GenerationError::InvalidInput(_))
        ));
    }

    #[test]
    fn pool_deserializes_with_defaults() {
        let json = r#"{"clusters": [
            {"id": "limgrave", "type": "mini_dungeon", "weight": 4,
             "entries": [{"id": "a"}, {"id": "b", "bidirectional": true}],
             "exits": [{"id": "b", "bidirectional": true}]}
        ]}"#;
        let pool: ClusterPool = serde_json::from_str(json).unwrap();
        let c = pool.get("limgrave").unwrap();
        assert_eq!(c.cluster_type, ClusterType::MiniDungeon);
        assert_eq!(c.num_one_way_entries(), 1);
        assert_eq!(c.num_two_way_entries(), 1);
        assert!(!c.allow_shared_entrance);
        assert!(c.zones.is_empty());
    }
}
