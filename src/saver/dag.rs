/*
dag.rs

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

//! Write a generated route graph to a file.
//!
//! The saved object is a serialization of the [`GenerationResult`] object in JSON format by using
//! [`serde`].
//! For the same seed, pool, and configuration, the output is byte-identical.

use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::Result;
use crate::generator::retry::GenerationResult;

/// [`DagSaver`] object.
pub struct DagSaver {
    /// Path to the output file.
    output_file: PathBuf,
}

impl DagSaver {
    /// Create a [`DagSaver`] object.
    pub fn new(output_file: PathBuf) -> Self {
        debug!("Output file: {output_file:?}");
        DagSaver { output_file }
    }

    /// Save the provided [`GenerationResult`] object.
    ///
    /// # Errors
    ///
    /// The method returns [`crate::error::GenerationError::Io`] if the file cannot be written.
    pub fn save(&self, result: &GenerationResult) -> Result<()> {
        let file: File = File::create(&self.output_file)?;
        let mut writer: BufWriter<File> = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Return the JSON document for the provided [`GenerationResult`] object.
///
/// # Errors
///
/// The function returns [`crate::error::GenerationError::Json`] if the serialization fails.
pub fn to_json(result: &GenerationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
