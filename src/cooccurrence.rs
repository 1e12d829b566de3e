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

use std::time::Instant;

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::matrix::SparseMatrix;
use crate::utils;

/// Normalisation steps applied to the raw co-occurrence counts. Enabled steps always run in the
/// order cosine similarity, row percentage, zero diagonal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooccurrenceOptions {
    pub cosine_similarity: bool,
    pub row_percentage: bool,
    pub zero_diagonal: bool,
}

impl CooccurrenceOptions {

    pub fn cosine() -> Self {
        CooccurrenceOptions { cosine_similarity: true, ..Default::default() }
    }

    pub fn percentage() -> Self {
        CooccurrenceOptions { row_percentage: true, ..Default::default() }
    }

    pub fn with_zero_diagonal(mut self) -> Self {
        self.zero_diagonal = true;
        self
    }
}

/// Owns an expanded interaction matrix and derives similarity matrices from it. The raw
/// co-occurrence counts `expandedᵗ · expanded` are computed on first use and kept until the
/// expanded matrix is replaced.
#[derive(Clone, Debug)]
pub struct CooccurrenceEngine {
    expanded: SparseMatrix,
    raw: Option<SparseMatrix>,
}

impl CooccurrenceEngine {

    pub fn new(expanded: SparseMatrix) -> Self {
        CooccurrenceEngine { expanded, raw: None }
    }

    pub fn expanded(&self) -> &SparseMatrix {
        &self.expanded
    }

    /// Swaps in a new expanded matrix and drops the cached counts.
    pub fn replace_expanded(&mut self, expanded: SparseMatrix) {
        self.expanded = expanded;
        self.raw = None;
    }

    pub fn is_raw_cached(&self) -> bool {
        self.raw.is_some()
    }

    /// The raw co-occurrence counts, entry `(a, b)` is the number of rows with both columns set.
    pub fn raw(&mut self) -> &SparseMatrix {
        if self.raw.is_some() {
            debug!("Reusing cached co-occurrence matrix");
        }

        let expanded = &self.expanded;

        self.raw.get_or_insert_with(|| {
            let start = Instant::now();
            let raw = expanded.transpose_multiply();

            info!(
                "Computed {}x{} co-occurrence matrix with {} entries in {}ms",
                raw.num_rows(),
                raw.num_cols(),
                raw.nnz(),
                utils::to_millis(start.elapsed()),
            );

            raw
        })
    }

    /// A similarity matrix for the given options, derived from the cached raw counts.
    pub fn compute(&mut self, options: &CooccurrenceOptions) -> SparseMatrix {
        let mut similarity = self.raw().clone();
        apply_options(&mut similarity, options);
        similarity
    }
}

/// Computes the co-occurrence matrix of `expanded` and normalises it according to `options`.
pub fn compute_cooccurrence(expanded: &SparseMatrix, options: &CooccurrenceOptions) -> SparseMatrix {
    let mut cooccurrences = expanded.transpose_multiply();
    apply_options(&mut cooccurrences, options);
    cooccurrences
}

/// Applies the enabled normalisation steps in place. Divisions by a zero diagonal entry yield 0,
/// the result never holds NaN or infinite values.
pub fn apply_options(cooccurrences: &mut SparseMatrix, options: &CooccurrenceOptions) {

    if options.cosine_similarity {
        debug!("Normalising co-occurrences to cosine similarities");
        cosine_similarity(cooccurrences);
    }

    if options.row_percentage {
        debug!("Normalising co-occurrences to row percentages");
        row_percentage(cooccurrences);
    }

    if options.zero_diagonal {
        debug!("Zeroing the diagonal");
        cooccurrences.zero_diagonal();
    }

    cooccurrences.eliminate_explicit_zeros();
}

/// `(a, b) / sqrt(d_a * d_b)` with `d` the diagonal, which keeps self-similarities at exactly 1.
fn cosine_similarity(cooccurrences: &mut SparseMatrix) {
    let diagonal = cooccurrences.diagonal();

    cooccurrences.map_entries(|row, col, value| {
        let magnitude = (diagonal[row] * diagonal[col]).sqrt();
        if magnitude > 0.0 {
            value / magnitude
        } else {
            0.0
        }
    });
}

fn row_percentage(cooccurrences: &mut SparseMatrix) {
    let diagonal = cooccurrences.diagonal();

    cooccurrences.map_entries(|row, _, value| {
        if diagonal[row] != 0.0 {
            value / diagonal[row]
        } else {
            0.0
        }
    });
}
