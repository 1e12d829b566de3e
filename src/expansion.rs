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

// Pseudo-unique expansion of quantity matrices. An item observed with a maximum quantity of
// `m` is split into `m` binary columns, and a quantity `q` sets the first `min(q, m)` of them.
// Repeated interactions thereby become distinguishable co-occurrence events.

use std::cmp;
use std::ops::Range;

use log::debug;
use serde_derive::Serialize;

use crate::error::{RecoError, Result};
use crate::matrix::SparseMatrix;

/// The contiguous range of expanded columns reserved for one original item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ItemSlice {
    pub base: u32,
    pub length: u32,
}

impl ItemSlice {

    pub fn columns(&self) -> Range<u32> {
        self.base..self.base + self.length
    }

    /// Columns set for `quantity` units. Filling always starts at the lowest offset of the slice
    /// and stops at its capacity.
    pub fn fill(&self, quantity: u32) -> Range<u32> {
        self.base..self.base + cmp::min(quantity, self.length)
    }
}

/// Bookkeeping between original items and expanded columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnMeta {
    slices: Vec<ItemSlice>,
    #[serde(skip)]
    owners: Vec<u32>,
}

impl ColumnMeta {

    /// Lays out one slice per item with the given lengths, fails if the total number of columns
    /// exceeds `max_columns`.
    pub fn from_slice_lengths(lengths: &[u32], max_columns: usize) -> Result<Self> {

        let limit = cmp::min(max_columns, u32::MAX as usize);
        let required: u64 = lengths.iter().map(|length| *length as u64).sum();

        if required > limit as u64 {
            return Err(RecoError::CapacityExceeded { required, limit });
        }

        let mut slices = Vec::with_capacity(lengths.len());
        let mut owners = Vec::with_capacity(required as usize);
        let mut base: u32 = 0;

        for (item, length) in lengths.iter().enumerate() {
            slices.push(ItemSlice { base, length: *length });
            owners.extend((0..*length).map(|_| item as u32));
            base += *length;
        }

        Ok(ColumnMeta { slices, owners })
    }

    pub fn num_items(&self) -> usize {
        self.slices.len()
    }

    pub fn num_columns(&self) -> usize {
        self.owners.len()
    }

    pub fn slices(&self) -> &[ItemSlice] {
        &self.slices
    }

    pub fn slice(&self, item: u32) -> Option<ItemSlice> {
        self.slices.get(item as usize).cloned()
    }

    /// The original item an expanded column belongs to.
    pub fn item_of(&self, column: u32) -> Option<u32> {
        self.owners.get(column as usize).cloned()
    }
}

/// Converts a stored matrix value into whole units of quantity.
pub fn to_units(value: f64) -> u32 {
    // float to int casts saturate
    value.round().max(0.0) as u32
}

/// Expands a `users x items` quantity matrix into a binary `users x columns` matrix.
pub fn expand(matrix: &SparseMatrix, max_columns: usize) -> Result<(SparseMatrix, ColumnMeta)> {

    let lengths: Vec<u32> = (0..matrix.num_cols())
        .map(|col| cmp::max(1, to_units(matrix.column_max(col))))
        .collect();

    let meta = ColumnMeta::from_slice_lengths(&lengths, max_columns)?;

    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(matrix.nnz());

    for (row, col, value) in matrix.nonzero_entries() {
        for column in meta.slices[col].fill(to_units(value)) {
            triplets.push((row, column as usize, 1.0));
        }
    }

    let expanded = SparseMatrix::from_triplets(matrix.num_rows(), meta.num_columns(), triplets)?;

    debug!(
        "Expanded {} items into {} pseudo-unique columns ({} entries)",
        meta.num_items(),
        meta.num_columns(),
        expanded.nnz(),
    );

    Ok((expanded, meta))
}
