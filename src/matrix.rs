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

use std::cmp;

use crate::error::{RecoError, Result};
use crate::types::{self, DenseVector, SparseVector};

/// Row and column indices are stored as `u32`.
const MAX_DIMENSION: usize = u32::MAX as usize;

/// A minimal sparse matrix of `f64` values, stored column by column. Each column maps row
/// indices to values, so per-column queries like `column_max` only touch the entries of that
/// column. Entries may hold an explicit zero after in-place updates, see
/// `eliminate_explicit_zeros`.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    num_rows: usize,
    num_cols: usize,
    columns: Vec<SparseVector>,
}

impl SparseMatrix {

    /// Creates an empty matrix of the given shape.
    pub fn new(num_rows: usize, num_cols: usize) -> Result<Self> {
        if num_rows > MAX_DIMENSION || num_cols > MAX_DIMENSION {
            return Err(RecoError::InvalidShape(format!(
                "a {}x{} matrix exceeds the maximum dimension of {}",
                num_rows, num_cols, MAX_DIMENSION)));
        }

        Ok(SparseMatrix::empty(num_rows, num_cols))
    }

    fn empty(num_rows: usize, num_cols: usize) -> Self {
        SparseMatrix {
            num_rows,
            num_cols,
            columns: vec![types::new_sparse_vector(0); num_cols],
        }
    }

    /// Builds a matrix from `(row, col, value)` triplets. Values of duplicate positions are
    /// summed up.
    pub fn from_triplets<I>(num_rows: usize, num_cols: usize, triplets: I) -> Result<Self>
        where I: IntoIterator<Item=(usize, usize, f64)> {

        let mut matrix = SparseMatrix::new(num_rows, num_cols)?;

        for (row, col, value) in triplets {
            if row >= num_rows || col >= num_cols {
                return Err(RecoError::InvalidShape(format!(
                    "entry ({}, {}) lies outside a {}x{} matrix", row, col, num_rows, num_cols)));
            }

            if !value.is_finite() {
                return Err(RecoError::InvalidShape(format!(
                    "entry ({}, {}) has non-finite value {}", row, col, value)));
            }

            *matrix.columns[col].entry(row as u32).or_insert(0.0) += value;
        }

        Ok(matrix)
    }

    /// Builds a matrix from dense rows, which must all have the same length.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self> {

        let num_cols = rows.first().map_or(0, |row| row.len());

        if let Some(ragged) = rows.iter().position(|row| row.len() != num_cols) {
            return Err(RecoError::InvalidShape(format!(
                "row {} has {} columns, expected {}", ragged, rows[ragged].len(), num_cols)));
        }

        let triplets = rows.iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values.iter()
                    .enumerate()
                    .filter(|&(_, value)| *value != 0.0)
                    .map(move |(col, value)| (row, col, *value))
            });

        SparseMatrix::from_triplets(rows.len(), num_cols, triplets)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Number of stored entries, explicit zeros included.
    pub fn nnz(&self) -> usize {
        self.columns.iter().map(|column| column.len()).sum()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.columns.get(col)
            .and_then(|column| column.get(&(row as u32)))
            .cloned()
            .unwrap_or(0.0)
    }

    /// Largest value stored in the column, 0 for a column without entries.
    pub fn column_max(&self, col: usize) -> f64 {
        let column = &self.columns[col];

        if column.is_empty() {
            0.0
        } else {
            column.values().cloned().fold(std::f64::NEG_INFINITY, f64::max)
        }
    }

    /// All entries with a value other than zero. Columns are visited in ascending order, the
    /// order within a column is fixed for a given matrix. Calling this again restarts the scan.
    pub fn nonzero_entries<'a>(&'a self) -> impl Iterator<Item=(usize, usize, f64)> + 'a {
        self.columns.iter()
            .enumerate()
            .flat_map(|(col, column)| {
                column.iter()
                    .filter(|&(_, value)| *value != 0.0)
                    .map(move |(row, value)| (*row as usize, col, *value))
            })
    }

    /// Non-zero entries sorted by row, then column.
    pub fn to_triplets(&self) -> Vec<(usize, usize, f64)> {
        let mut triplets: Vec<(usize, usize, f64)> = self.nonzero_entries().collect();
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        triplets
    }

    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![types::new_dense_vector(self.num_cols); self.num_rows];
        for (row, col, value) in self.nonzero_entries() {
            dense[row][col] = value;
        }
        dense
    }

    /// The entries `(i, i)` for `i < min(rows, cols)`.
    pub fn diagonal(&self) -> DenseVector {
        (0..cmp::min(self.num_rows, self.num_cols))
            .map(|index| self.get(index, index))
            .collect()
    }

    pub fn set_diagonal(&mut self, value: f64) {
        for index in 0..cmp::min(self.num_rows, self.num_cols) {
            self.columns[index].insert(index as u32, value);
        }
    }

    /// Sets stored diagonal entries to zero in place, they stay stored as explicit zeros.
    pub fn zero_diagonal(&mut self) {
        for index in 0..cmp::min(self.num_rows, self.num_cols) {
            if let Some(value) = self.columns[index].get_mut(&(index as u32)) {
                *value = 0.0;
            }
        }
    }

    pub fn eliminate_explicit_zeros(&mut self) {
        for column in self.columns.iter_mut() {
            column.retain(|_, value| *value != 0.0);
        }
    }

    pub fn transpose(&self) -> SparseMatrix {
        let mut transposed = SparseMatrix::empty(self.num_cols, self.num_rows);

        for (col, column) in self.columns.iter().enumerate() {
            for (row, value) in column.iter() {
                transposed.columns[*row as usize].insert(col as u32, *value);
            }
        }

        transposed
    }

    /// Matrix product `self · other`.
    pub fn multiply(&self, other: &SparseMatrix) -> Result<SparseMatrix> {

        if self.num_cols != other.num_rows {
            return Err(RecoError::DimensionMismatch {
                operation: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut product = SparseMatrix::empty(self.num_rows, other.num_cols);

        for (col, other_column) in other.columns.iter().enumerate() {
            let product_column = &mut product.columns[col];

            for (inner, other_value) in other_column.iter() {
                for (row, value) in self.columns[*inner as usize].iter() {
                    *product_column.entry(*row).or_insert(0.0) += value * other_value;
                }
            }
        }

        Ok(product)
    }

    /// Product `self · vector` with a sparse column vector of the given dimension.
    pub fn multiply_vector(&self, vector: &SparseVector, dimension: usize) -> Result<SparseVector> {

        if self.num_cols != dimension {
            return Err(RecoError::DimensionMismatch {
                operation: "multiply_vector",
                left: self.shape(),
                right: (dimension, 1),
            });
        }

        let mut result = types::new_sparse_vector(vector.len());

        for (inner, factor) in vector.iter() {
            if let Some(column) = self.columns.get(*inner as usize) {
                for (row, value) in column.iter() {
                    *result.entry(*row).or_insert(0.0) += value * factor;
                }
            }
        }

        Ok(result)
    }

    /// Computes `selfᵗ · self` without building the transpose. Every row contributes the
    /// pairwise products of its entries, so the cost grows with the sum of squared row lengths.
    /// For an interaction matrix this is the dominant cost of the co-occurrence computation,
    /// driven by the users with the longest histories.
    pub fn transpose_multiply(&self) -> SparseMatrix {

        let mut rows: Vec<Vec<(u32, f64)>> = vec![Vec::new(); self.num_rows];

        for (col, column) in self.columns.iter().enumerate() {
            for (row, value) in column.iter() {
                if *value != 0.0 {
                    rows[*row as usize].push((col as u32, *value));
                }
            }
        }

        let mut product = SparseMatrix::empty(self.num_cols, self.num_cols);

        for row in rows.iter() {
            for &(col_a, value_a) in row.iter() {
                let product_column = &mut product.columns[col_a as usize];

                for &(col_b, value_b) in row.iter() {
                    *product_column.entry(col_b).or_insert(0.0) += value_a * value_b;
                }
            }
        }

        product
    }

    /// Multiplies every entry in row `i` by `factors[i]`, e.g. to weight co-occurrences by
    /// inverse row norms.
    pub fn scale_rows(&mut self, factors: &[f64]) -> Result<()> {

        if factors.len() != self.num_rows {
            return Err(RecoError::DimensionMismatch {
                operation: "scale_rows",
                left: self.shape(),
                right: (factors.len(), 1),
            });
        }

        for column in self.columns.iter_mut() {
            for (row, value) in column.iter_mut() {
                *value *= factors[*row as usize];
            }
        }

        Ok(())
    }

    /// Multiplies every entry in column `j` by `factors[j]`.
    pub fn scale_columns(&mut self, factors: &[f64]) -> Result<()> {

        if factors.len() != self.num_cols {
            return Err(RecoError::DimensionMismatch {
                operation: "scale_columns",
                left: self.shape(),
                right: (factors.len(), 1),
            });
        }

        for (column, factor) in self.columns.iter_mut().zip(factors.iter()) {
            for value in column.values_mut() {
                *value *= factor;
            }
        }

        Ok(())
    }

    /// Replaces every stored entry with `f(row, col, value)`.
    pub fn map_entries<F>(&mut self, mut f: F)
        where F: FnMut(usize, usize, f64) -> f64 {

        for (col, column) in self.columns.iter_mut().enumerate() {
            for (row, value) in column.iter_mut() {
                *value = f(*row as usize, col, *value);
            }
        }
    }
}


#[cfg(test)]
mod tests {

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::error::RecoError;
    use crate::matrix::SparseMatrix;
    use crate::types;

    fn close_enough_to(value: f64, expected: f64) -> bool {
        (value - expected).abs() < 0.000_000_1
    }

    fn random_matrix(rng: &mut StdRng, num_rows: usize, num_cols: usize) -> SparseMatrix {
        let mut triplets = Vec::new();
        for row in 0..num_rows {
            for col in 0..num_cols {
                if rng.gen_range(0..4) == 0 {
                    triplets.push((row, col, rng.gen_range(1..5) as f64));
                }
            }
        }
        SparseMatrix::from_triplets(num_rows, num_cols, triplets).unwrap()
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let matrix = SparseMatrix::from_triplets(2, 3, vec![
            (0, 0, 1.0),
            (1, 2, 2.0),
            (0, 0, 3.0),
            (1, 1, 1.5),
            (1, 2, 0.5),
        ]).unwrap();

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(
            matrix.to_triplets(),
            vec![(0, 0, 4.0), (1, 1, 1.5), (1, 2, 2.5)]
        );
    }

    #[test]
    fn nonzero_entries_is_restartable() {
        let matrix = SparseMatrix::from_triplets(3, 3, vec![
            (0, 1, 1.0), (2, 0, 2.0), (1, 1, 3.0), (2, 2, 0.0),
        ]).unwrap();

        let first: Vec<_> = matrix.nonzero_entries().collect();
        let second: Vec<_> = matrix.nonzero_entries().collect();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(matrix.nnz(), 4);
    }

    #[test]
    fn out_of_bounds_triplet_is_rejected() {
        let result = SparseMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (2, 1, 1.0)]);
        match result {
            Err(RecoError::InvalidShape(_)) => {},
            other => panic!("expected InvalidShape, got {:?}", other),
        }

        let result = SparseMatrix::from_triplets(2, 2, vec![(1, 5, 1.0)]);
        assert!(matches!(result, Err(RecoError::InvalidShape(_))));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let result = SparseMatrix::from_triplets(1, 1, vec![(0, 0, std::f64::NAN)]);
        assert!(matches!(result, Err(RecoError::InvalidShape(_))));
    }

    #[test]
    fn ragged_dense_input_is_rejected() {
        let result = SparseMatrix::from_dense(&[vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(RecoError::InvalidShape(_))));
    }

    #[test]
    fn from_dense_roundtrip() {
        let rows = vec![vec![1.0, 0.0, 2.0], vec![0.0, 1.0, 1.0]];
        let matrix = SparseMatrix::from_dense(&rows).unwrap();

        assert_eq!(matrix.nnz(), 4);
        assert_eq!(matrix.to_dense(), rows);
    }

    #[test]
    fn column_max() {
        let matrix = SparseMatrix::from_triplets(3, 3, vec![
            (0, 0, 1.0), (1, 0, 4.0), (2, 0, 2.0), (1, 2, 7.0),
        ]).unwrap();

        assert_eq!(matrix.column_max(0), 4.0);
        assert_eq!(matrix.column_max(1), 0.0);
        assert_eq!(matrix.column_max(2), 7.0);
    }

    #[test]
    fn diagonal_of_rectangular_matrix() {
        let matrix = SparseMatrix::from_triplets(2, 4, vec![
            (0, 0, 3.0), (0, 1, 1.0), (1, 3, 2.0),
        ]).unwrap();

        assert_eq!(matrix.diagonal(), vec![3.0, 0.0]);
    }

    #[test]
    fn diagonal_updates() {
        let mut matrix = SparseMatrix::from_triplets(3, 3, vec![
            (0, 0, 3.0), (0, 1, 1.0), (1, 0, 1.0),
        ]).unwrap();

        matrix.set_diagonal(5.0);
        assert_eq!(matrix.diagonal(), vec![5.0, 5.0, 5.0]);

        matrix.zero_diagonal();
        assert_eq!(matrix.diagonal(), vec![0.0, 0.0, 0.0]);
        assert_eq!(matrix.nnz(), 5);

        matrix.eliminate_explicit_zeros();
        assert_eq!(matrix.nnz(), 2);
        assert_eq!(matrix.to_triplets(), vec![(0, 1, 1.0), (1, 0, 1.0)]);
    }

    #[test]
    fn multiply() {
        let a = SparseMatrix::from_dense(&[vec![1.0, 2.0], vec![0.0, 3.0]]).unwrap();
        let b = SparseMatrix::from_dense(&[vec![4.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]]).unwrap();

        let product = a.multiply(&b).unwrap();

        assert_eq!(product.to_dense(), vec![vec![6.0, 2.0, 1.0], vec![3.0, 3.0, 0.0]]);
    }

    #[test]
    fn multiply_with_mismatching_dimensions() {
        let a = SparseMatrix::new(2, 3).unwrap();
        let b = SparseMatrix::new(2, 3).unwrap();

        match a.multiply(&b) {
            Err(RecoError::DimensionMismatch { left, right, .. }) => {
                assert_eq!(left, (2, 3));
                assert_eq!(right, (2, 3));
            },
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn multiply_vector() {
        let matrix = SparseMatrix::from_dense(&[
            vec![1.0, 0.0, 2.0],
            vec![0.0, 3.0, 1.0],
        ]).unwrap();

        let mut vector = types::new_sparse_vector(2);
        vector.insert(0, 2.0);
        vector.insert(2, 1.0);

        let result = matrix.multiply_vector(&vector, 3).unwrap();

        assert_eq!(result.get(&0), Some(&4.0));
        assert_eq!(result.get(&1), Some(&1.0));

        assert!(matches!(
            matrix.multiply_vector(&vector, 2),
            Err(RecoError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn transpose_multiply_matches_naive_product() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let num_rows = rng.gen_range(1..12);
            let num_cols = rng.gen_range(1..9);
            let matrix = random_matrix(&mut rng, num_rows, num_cols);

            let fast = matrix.transpose_multiply();
            let naive = matrix.transpose().multiply(&matrix).unwrap();

            assert_eq!(fast.shape(), (num_cols, num_cols));
            assert_eq!(fast.to_triplets(), naive.to_triplets());
        }
    }

    #[test]
    fn transpose_multiply_counts_cooccurrences() {
        let matrix = SparseMatrix::from_dense(&[
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ]).unwrap();

        assert_eq!(matrix.transpose_multiply().to_dense(), vec![
            vec![1.0, 0.0, 1.0],
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 2.0],
        ]);
    }

    #[test]
    fn scaling() {
        let mut matrix = SparseMatrix::from_dense(&[
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        ]).unwrap();

        matrix.scale_rows(&[2.0, 0.5]).unwrap();
        assert_eq!(matrix.to_dense(), vec![vec![2.0, 4.0], vec![1.5, 2.0]]);

        matrix.scale_columns(&[1.0, 0.25]).unwrap();
        assert_eq!(matrix.to_dense(), vec![vec![2.0, 1.0], vec![1.5, 0.5]]);

        assert!(matrix.scale_rows(&[1.0]).is_err());
        assert!(matrix.scale_columns(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn map_entries_sees_positions() {
        let mut matrix = SparseMatrix::from_dense(&[
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ]).unwrap();

        matrix.map_entries(|row, col, value| value * (row * 2 + col) as f64);

        assert!(close_enough_to(matrix.get(0, 0), 0.0));
        assert!(close_enough_to(matrix.get(0, 1), 1.0));
        assert!(close_enough_to(matrix.get(1, 1), 3.0));
        assert!(close_enough_to(matrix.get(1, 0), 0.0));
    }
}
