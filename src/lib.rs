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

// Item recommendations from co-occurrence statistics of implicit feedback.
//
// Interaction quantities are expanded into pseudo-unique binary columns, the item-item
// co-occurrence matrix of the expansion is optionally normalised (cosine similarity, row
// percentages, zeroed diagonal), and a user's known interactions are projected through it to
// score all items.

pub mod cooccurrence;
pub mod error;
pub mod expansion;
pub mod index;
pub mod io;
pub mod matrix;
pub mod model;
pub mod predict;
pub mod source;
pub mod topk;
pub mod types;
pub mod utils;


pub use crate::cooccurrence::CooccurrenceOptions;
pub use crate::error::{RecoError, Result};
pub use crate::matrix::SparseMatrix;
pub use crate::model::{load, Model, ModelConfig, Recommendation};
pub use crate::predict::ScoreReduction;
pub use crate::source::{InteractionSource, LoadSource};
pub use crate::types::Interaction;
