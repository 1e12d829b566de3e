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

use fnv::FnvHashMap;
use serde_derive::{Deserialize, Serialize};

pub type DenseVector = Vec<f64>;

/// Sparse vector keyed by dimension, absent keys are zero.
pub type SparseVector = FnvHashMap<u32, f64>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

pub fn new_sparse_vector(capacity: usize) -> SparseVector {
    FnvHashMap::with_capacity_and_hasher(capacity, Default::default())
}

/// A single observation from the interaction stream: `user` engaged `quantity` times with `item`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user: String,
    pub item: String,
    pub quantity: u32,
}

impl Interaction {
    pub fn new<U: Into<String>, I: Into<String>>(user: U, item: I, quantity: u32) -> Self {
        Interaction { user: user.into(), item: item.into(), quantity }
    }
}
