/*
retry.rs

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

//! Run generation attempts until one produces a valid route graph.
//!
//! Each attempt owns a fresh [`ChaCha8Rng`] generator seeded from the attempt seed, so that an
//! attempt can be replayed from its seed alone.
//! A pinned seed gives exactly one attempt, and its failure is returned as is.
//!
//! # Examples
//!
//! ```no_run
//! use fogdag::config::GeneratorConfig;
//! use fogdag::generator::retry;
//! use fogdag::saver::pool;
//! use std::path::Path;
//!
//! let cluster_pool = pool::load_pool(Path::new("pool.json")).unwrap();
//! let result = retry::generate(&cluster_pool, &GeneratorConfig::default(), Some(42)).unwrap();
//! println!("{} nodes after {} attempt(s)", result.dag.len(), result.attempts);
//! ```

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::balance::{BalanceReport, BudgetWarning};
use super::builder::Generator;
use super::cluster::{ClusterPool, PoolRoles};
use super::dag::Dag;
use super::planner::LayerPlan;
use super::validator::{self, ValidationReport};
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};

/// Successful generation.
#[derive(Serialize, Debug, Clone)]
pub struct GenerationResult {
    /// Seed of the successful attempt. Replaying it gives the same graph.
    pub seed: u64,

    /// Number of attempts, the successful one included.
    pub attempts: usize,
    pub plan: LayerPlan,
    pub dag: Dag,
    pub balance: BalanceReport,

    /// Advisory diagnostics.
    pub warnings: Vec<BudgetWarning>,

    /// Time spent over all the attempts.
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Plan, build, and validate one graph from the given seed.
///
/// # Errors
///
/// The function returns [`GenerationError::GenerationFailure`] if the graph cannot be built, and
/// [`GenerationError::ValidationFailure`] if the finished graph fails a check.
pub fn run_attempt(
    pool: &ClusterPool,
    roles: &PoolRoles,
    config: &GeneratorConfig,
    seed: u64,
) -> Result<GenerationResult> {
    let start: Instant = Instant::now();
    let mut rng: ChaCha8Rng = ChaCha8Rng::seed_from_u64(seed);

    let plan: LayerPlan = LayerPlan::generate(config, &mut rng);
    let dag: Dag = {
        let mut generator = Generator::new(pool, roles, config, &plan, &mut rng);
        generator.build()?;
        generator.into_dag()
    };

    let report: ValidationReport = validator::validate(&dag, config);
    if !report.is_valid() {
        return Err(GenerationError::ValidationFailure {
            failures: report.failures,
        });
    }
    debug!(
        "Seed {seed}: {} nodes, {} edges, {} paths",
        dag.len(),
        dag.edges().len(),
        report.balance.num_paths
    );

    Ok(GenerationResult {
        seed,
        attempts: 1,
        plan,
        dag,
        balance: report.balance,
        warnings: report.budget_warning.into_iter().collect(),
        elapsed: start.elapsed(),
    })
}

/// Generate a route graph.
///
/// When `seed` is `None`, the attempt seeds are drawn from the thread-local generator.
///
/// # Errors
///
/// See [`generate_with`].
pub fn generate(
    pool: &ClusterPool,
    config: &GeneratorConfig,
    seed: Option<u64>,
) -> Result<GenerationResult> {
    generate_with(pool, config, seed, &mut rand::rng())
}

/// Generate a route graph, drawing the attempt seeds from `seeds` when `seed` is `None`.
///
/// # Errors
///
/// The function returns [`GenerationError::InvalidInput`] if the configuration or the pool
/// cannot be used.
/// With a pinned seed, the failure of the single attempt is returned.
/// Otherwise, [`GenerationError::RetryExhausted`] is returned when all the attempts failed.
pub fn generate_with<R: Rng + ?Sized>(
    pool: &ClusterPool,
    config: &GeneratorConfig,
    seed: Option<u64>,
    seeds: &mut R,
) -> Result<GenerationResult> {
    config.validate()?;
    let roles: PoolRoles = pool.resolve_roles(config)?;

    if let Some(seed) = seed {
        info!("Pinned seed {seed}: single attempt");
        return run_attempt(pool, &roles, config, seed);
    }

    let start: Instant = Instant::now();
    let mut last: Option<GenerationError> = None;
    for attempt in 1..=config.max_attempts {
        let attempt_seed: u64 = seeds.random();
        match run_attempt(pool, &roles, config, attempt_seed) {
            Ok(mut result) => {
                info!("Attempt {attempt} (seed {attempt_seed}) succeeded");
                result.attempts = attempt;
                result.elapsed = start.elapsed();
                return Ok(result);
            }
            Err(e) if e.is_attempt_failure() => {
                info!("Attempt {attempt} (seed {attempt_seed}) failed: {e}");
                last = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(GenerationError::RetryExhausted {
        attempts: config.max_attempts,
        last: Box::new(last.unwrap_or_else(|| {
            GenerationError::InvalidInput("no attempt was made".to_string())
        })),
    })
}
