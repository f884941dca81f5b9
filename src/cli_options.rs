/*
cli_options.rs

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

//! Process command-line options.
//!
//! # Examples
//!
//! Generate a graph from a pool file and print its spoiler log:
//!
//! ```text
//! $ fogdag pool.json --seed 42
//! Fogdag spoiler log
//! Seed: 42
//! ...
//! ```
//!
//! Generate a graph with a custom configuration and save it in JSON format:
//!
//! ```text
//! $ fogdag pool.json --config run.json --max-paths 2 --output graph.json --summary
//!
//!       attempts = 3
//!           time = 0.004s
//!          nodes = 21
//!          edges = 24
//!          paths = 6
//!         spread = 7
//! ```

use chrono::Local;
use clap::Parser;
use log::{debug, error};
use std::env;
use std::path::PathBuf;

use fogdag::config::{COPYRIGHT_NOTICE, GeneratorConfig};
use fogdag::error::Result;
use fogdag::generator::cluster::{ClusterPool, ClusterType};
use fogdag::generator::retry::{self, GenerationResult};
use fogdag::generator::spoiler;
use fogdag::saver::dag::DagSaver;
use fogdag::saver::pool;

/// Generate random route graphs between fog gate clusters.
#[derive(Parser)]
#[command(about, long_about = None, version, long_version = COPYRIGHT_NOTICE)]
struct Args {
    /// JSON file with the cluster pool
    pool: PathBuf,

    /// JSON file with the generator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for a single reproducible attempt
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of attempts when the seed is not pinned
    #[arg(short, long)]
    attempts: Option<usize>,

    /// Maximum number of parallel branches
    #[arg(long)]
    max_paths: Option<usize>,

    /// Minimum number of planned layers
    #[arg(long)]
    min_layers: Option<usize>,

    /// Maximum number of planned layers
    #[arg(long)]
    max_layers: Option<usize>,

    /// Maximum weight difference between paths
    #[arg(short, long)]
    tolerance: Option<u32>,

    /// Cluster type of the first layer
    #[arg(value_enum, short, long)]
    first_layer: Option<ClusterType>,

    /// Write the graph in JSON format to this file instead of printing the spoiler log
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print some statistics after generating the graph
    #[arg(short = 'S', long, default_value_t = false)]
    summary: bool,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

impl Args {
    /// Apply the command-line overrides to the configuration.
    fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(a) = self.attempts {
            config.max_attempts = a;
        }
        if let Some(p) = self.max_paths {
            config.max_parallel_paths = p;
        }
        if let Some(l) = self.min_layers {
            config.min_layers = l;
        }
        if let Some(l) = self.max_layers {
            config.max_layers = l;
        }
        if let Some(t) = self.tolerance {
            config.budget_tolerance = t;
        }
        if self.first_layer.is_some() {
            config.first_layer_type = self.first_layer;
        }
    }
}

/// Parse and process command-line options, and return the exit code.
pub fn parse() -> u8 {
    let args: Args = Args::parse();

    if args.debug {
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    env_logger::init();

    match run(&args) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            1
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let cluster_pool: ClusterPool = pool::load_pool(&args.pool)?;
    let mut config: GeneratorConfig = match &args.config {
        Some(path) => pool::load_config(path)?,
        None => GeneratorConfig::default(),
    };
    args.apply(&mut config);
    debug!("Configuration: {config:?}");

    let result: GenerationResult = retry::generate(&cluster_pool, &config, args.seed)?;

    match &args.output {
        Some(path) => DagSaver::new(path.clone()).save(&result)?,
        None => print!("{}", spoiler::render(&result, Local::now())),
    }

    if args.summary {
        println!(
            "
      attempts = {}
          time = {}s
         nodes = {}
         edges = {}
         paths = {}
        spread = {}",
            result.attempts,
            result.elapsed.as_secs_f32(),
            result.dag.len(),
            result.dag.edges().len(),
            result.balance.num_paths,
            result.balance.spread
        );
    }
    Ok(())
}
