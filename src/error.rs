/*
error.rs

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

//! Generation errors.

use thiserror::Error;

use crate::generator::builder::Operation;
use crate::generator::validator::ValidationIssue;

/// Result type of the generator.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Type of errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No compatible cluster for a required operation. The attempt is abandoned.
    #[error("layer {layer}: {operation} failed: {reason}")]
    GenerationFailure {
        layer: usize,
        operation: Operation,
        reason: String,
    },

    /// The finished graph failed a structural or content check.
    #[error("validation failed: {}", describe(.failures))]
    ValidationFailure { failures: Vec<ValidationIssue> },

    /// All the attempts failed.
    #[error("no valid graph after {attempts} attempts (last failure: {last})")]
    RetryExhausted {
        attempts: usize,
        last: Box<GenerationError>,
    },

    /// The cluster pool or the configuration cannot be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Whether a new attempt with another seed could succeed.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            GenerationError::GenerationFailure { .. } | GenerationError::ValidationFailure { .. }
        )
    }
}

fn describe(failures: &[ValidationIssue]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<String>>()
        .join("; ")
}
