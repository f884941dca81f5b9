/*
pool.rs

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

//! Load the cluster pool and the generator configuration.
//!
//! Both files are JSON documents deserialized with [`serde`].
//! The pool file has the following structure:
//!
//! ```json
//! {
//!   "clusters": [
//!     {
//!       "id": "chapel",
//!       "zones": ["chapel", "stranded_graveyard"],
//!       "type": "start",
//!       "weight": 0,
//!       "entries": [],
//!       "exits": [{"id": "chapel_door"}, {"id": "chapel_cliff"}]
//!     }
//!   ]
//! }
//! ```
//!
//! The configuration file only lists the parameters to change.

use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::generator::cluster::ClusterPool;

/// Read the cluster pool from the given file.
///
/// # Errors
///
/// The function returns [`crate::error::GenerationError::Io`] if the file cannot be read, and
/// [`crate::error::GenerationError::Json`] if its content is not a valid pool.
pub fn load_pool(path: &Path) -> Result<ClusterPool> {
    let file: File = File::open(path)?;
    let reader: BufReader<File> = BufReader::new(file);
    let pool: ClusterPool = serde_json::from_reader(reader)?;
    debug!("Loaded {} clusters from {path:?}", pool.len());
    Ok(pool)
}

/// Read the generator configuration from the given file.
///
/// # Errors
///
/// Same as [`load_pool`].
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let file: File = File::open(path)?;
    let reader: BufReader<File> = BufReader::new(file);
    let config: GeneratorConfig = serde_json::from_reader(reader)?;
    debug!("Loaded configuration from {path:?}");
    Ok(config)
}
