/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use thiserror::Error;

/// Errors raised while loading a model or computing with it. Arithmetic degeneracies such as
/// division by zero are never errors, they normalise to 0.
#[derive(Debug, Error)]
pub enum RecoError {
    /// Malformed construction input, e.g. an entry outside the declared bounds
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Operands of a matrix operation have incompatible shapes
    #[error("dimension mismatch in {operation}: {left:?} vs {right:?}")]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Pseudo-unique expansion would allocate more columns than allowed
    #[error("expansion requires {required} columns, but at most {limit} are allowed")]
    CapacityExceeded { required: u64, limit: usize },

    /// Strict prediction against an item the model has never seen
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// An interaction record that cannot be parsed
    #[error("malformed interaction in line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecoError>;
