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
use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::error::{RecoError, Result};
use crate::expansion::ColumnMeta;
use crate::matrix::SparseMatrix;
use crate::types::{self, DenseVector, SparseVector};

/// Known interactions of a user in expanded column space.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetVector {
    dimension: usize,
    entries: SparseVector,
}

impl TargetVector {

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &SparseVector {
        &self.entries
    }
}

/// Scores per expanded column.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionVector {
    dimension: usize,
    scores: SparseVector,
}

impl PredictionVector {

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn score(&self, column: u32) -> f64 {
        self.scores.get(&column).cloned().unwrap_or(0.0)
    }

    pub fn to_dense(&self) -> DenseVector {
        let mut dense = types::new_dense_vector(self.dimension);
        for (column, score) in self.scores.iter() {
            dense[*column as usize] = *score;
        }
        dense
    }
}

/// How the scores of the expanded columns of an item are folded into a single item score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReduction {
    /// Sum over all columns of the item
    Sum,
    /// Score of the first column of the item only
    First,
}

impl Default for ScoreReduction {
    fn default() -> Self {
        ScoreReduction::Sum
    }
}

/// Builds the expanded target vector from `(item index, quantity)` pairs, setting the same
/// columns the expansion of an interaction with that quantity would set. Items without a slice
/// fail in `strict` mode and are skipped otherwise.
pub fn build_target_vector<I>(meta: &ColumnMeta, quantities: I, strict: bool) -> Result<TargetVector>
    where I: IntoIterator<Item=(u32, u32)> {

    let mut entries = types::new_sparse_vector(10);

    for (item, quantity) in quantities {
        match meta.slice(item) {
            Some(slice) => {
                for column in slice.fill(quantity) {
                    entries.insert(column, 1.0);
                }
            },
            None if strict => return Err(RecoError::UnknownItem(item.to_string())),
            None => warn!("Ignoring unknown item index {} in target", item),
        }
    }

    Ok(TargetVector { dimension: meta.num_columns(), entries })
}

/// Projects the target through the similarity matrix, `similarity · target`.
pub fn predict(similarity: &SparseMatrix, target: &TargetVector) -> Result<PredictionVector> {
    let scores = similarity.multiply_vector(&target.entries, target.dimension)?;
    Ok(PredictionVector { dimension: similarity.num_rows(), scores })
}

/// Folds column scores into one score per item index. Items scoring exactly 0 are left out.
pub fn fold_to_item_scores(
    prediction: &PredictionVector,
    meta: &ColumnMeta,
    reduction: ScoreReduction,
) -> FnvHashMap<u32, f64> {

    let mut item_scores: FnvHashMap<u32, f64> =
        FnvHashMap::with_capacity_and_hasher(prediction.scores.len(), Default::default());

    for (column, score) in prediction.scores.iter() {
        if let Some(item) = meta.item_of(*column) {
            match reduction {
                ScoreReduction::Sum => {
                    *item_scores.entry(item).or_insert(0.0) += *score;
                },
                ScoreReduction::First => {
                    let is_first = meta.slice(item).map_or(false, |slice| slice.base == *column);
                    if is_first {
                        item_scores.insert(item, *score);
                    }
                },
            }
        }
    }

    item_scores.retain(|_, score| *score != 0.0);
    item_scores
}

/// Like `fold_to_item_scores`, but with an entry for every item.
pub fn fold_to_dense_item_scores(
    prediction: &PredictionVector,
    meta: &ColumnMeta,
    reduction: ScoreReduction,
) -> DenseVector {

    let mut dense = types::new_dense_vector(meta.num_items());
    for (item, score) in fold_to_item_scores(prediction, meta, reduction) {
        dense[item as usize] = score;
    }
    dense
}


#[cfg(test)]
mod tests {

    use crate::cooccurrence::{self, CooccurrenceOptions};
    use crate::error::RecoError;
    use crate::expansion::{self, ColumnMeta};
    use crate::matrix::SparseMatrix;
    use crate::predict::{self, PredictionVector, ScoreReduction};
    use crate::types;

    fn rounded(value: f64, decimals: i32) -> f64 {
        let factor = 10_f64.powi(decimals);
        (value * factor).round() / factor
    }

    fn identity(dimension: usize) -> SparseMatrix {
        let mut matrix = SparseMatrix::new(dimension, dimension).unwrap();
        matrix.set_diagonal(1.0);
        matrix
    }

    #[test]
    fn target_vector_is_clamped_per_item() {
        let meta = ColumnMeta::from_slice_lengths(&[1, 3, 2], 10).unwrap();

        let target = predict::build_target_vector(&meta, vec![(1, 2), (2, 5), (0, 0)], false)
            .unwrap();

        assert_eq!(target.dimension(), 6);

        let mut columns: Vec<u32> = target.entries().keys().cloned().collect();
        columns.sort();
        assert_eq!(columns, vec![1, 2, 4, 5]);
    }

    #[test]
    fn unknown_items_in_strict_and_lenient_mode() {
        let meta = ColumnMeta::from_slice_lengths(&[1, 1], 10).unwrap();

        let lenient = predict::build_target_vector(&meta, vec![(0, 1), (7, 1)], false).unwrap();
        assert_eq!(lenient.entries().len(), 1);

        match predict::build_target_vector(&meta, vec![(0, 1), (7, 1)], true) {
            Err(RecoError::UnknownItem(item)) => assert_eq!(item, "7"),
            other => panic!("expected UnknownItem, got {:?}", other),
        }
    }

    #[test]
    fn identity_similarity_reproduces_clamped_quantities() {
        let meta = ColumnMeta::from_slice_lengths(&[2, 1, 4], 10).unwrap();
        let similarity = identity(meta.num_columns());

        let target = predict::build_target_vector(&meta, vec![(0, 5), (1, 1), (2, 3)], true)
            .unwrap();
        let prediction = predict::predict(&similarity, &target).unwrap();

        let scores = predict::fold_to_dense_item_scores(&prediction, &meta, ScoreReduction::Sum);
        assert_eq!(scores, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn summed_scores_ignore_column_order_within_an_item() {
        let meta = ColumnMeta::from_slice_lengths(&[3, 2], 10).unwrap();

        let mut scores = types::new_sparse_vector(5);
        scores.insert(0, 0.5);
        scores.insert(1, 0.25);
        scores.insert(3, 2.0);
        let prediction = PredictionVector { dimension: 5, scores };

        let mut permuted = types::new_sparse_vector(5);
        permuted.insert(2, 0.5);
        permuted.insert(0, 0.25);
        permuted.insert(4, 2.0);
        let permuted_prediction = PredictionVector { dimension: 5, scores: permuted };

        assert_eq!(
            predict::fold_to_item_scores(&prediction, &meta, ScoreReduction::Sum),
            predict::fold_to_item_scores(&permuted_prediction, &meta, ScoreReduction::Sum),
        );
    }

    #[test]
    fn first_column_reduction() {
        let meta = ColumnMeta::from_slice_lengths(&[3, 2], 10).unwrap();

        let mut scores = types::new_sparse_vector(5);
        scores.insert(0, 0.5);
        scores.insert(1, 0.25);
        scores.insert(4, 2.0);
        let prediction = PredictionVector { dimension: 5, scores };

        let item_scores = predict::fold_to_item_scores(&prediction, &meta, ScoreReduction::First);

        assert_eq!(item_scores.len(), 1);
        assert_eq!(item_scores.get(&0), Some(&0.5));

        let dense = predict::fold_to_dense_item_scores(&prediction, &meta, ScoreReduction::First);
        assert_eq!(dense, vec![0.5, 0.0]);
    }

    #[test]
    fn row_percentage_prediction() {
        let interactions = SparseMatrix::from_dense(&[
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ]).unwrap();

        let (expanded, meta) = expansion::expand(&interactions, 100).unwrap();
        let similarity =
            cooccurrence::compute_cooccurrence(&expanded, &CooccurrenceOptions::percentage());

        let target = predict::build_target_vector(&meta, vec![(0, 1)], true).unwrap();
        let prediction = predict::predict(&similarity, &target).unwrap();

        let scores: Vec<f64> = prediction.to_dense()
            .into_iter()
            .map(|score| rounded(score, 10))
            .collect();

        assert_eq!(scores, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn cosine_prediction_on_binary_interactions() {
        let interactions = SparseMatrix::from_dense(&[
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ]).unwrap();

        let (expanded, meta) = expansion::expand(&interactions, 100).unwrap();
        let similarity =
            cooccurrence::compute_cooccurrence(&expanded, &CooccurrenceOptions::cosine());

        let target = predict::build_target_vector(&meta, vec![(0, 1)], true).unwrap();
        let prediction = predict::predict(&similarity, &target).unwrap();

        let scores: Vec<f64> = prediction.to_dense()
            .into_iter()
            .map(|score| rounded(score, 10))
            .collect();

        assert_eq!(scores, vec![1.0, 0.0, 0.7071067812]);

        assert_eq!(prediction.score(0), 1.0);
        assert_eq!(prediction.score(1), 0.0);
        assert_eq!(rounded(prediction.score(2), 10), 0.7071067812);
    }

    #[test]
    fn cosine_prediction_on_expanded_quantities() {
        let interactions = SparseMatrix::from_dense(&[
            vec![1.0, 0.0, 2.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ]).unwrap();

        let (expanded, meta) = expansion::expand(&interactions, 100).unwrap();
        let similarity =
            cooccurrence::compute_cooccurrence(&expanded, &CooccurrenceOptions::cosine());

        let target = predict::build_target_vector(&meta, vec![(0, 1)], true).unwrap();
        let prediction = predict::predict(&similarity, &target).unwrap();

        let first = predict::fold_to_item_scores(&prediction, &meta, ScoreReduction::First);
        assert_eq!(rounded(first[&0], 2), 1.0);
        assert_eq!(rounded(first[&2], 2), 0.71);
        assert!(!first.contains_key(&1));

        let summed = predict::fold_to_item_scores(&prediction, &meta, ScoreReduction::Sum);
        assert_eq!(rounded(summed[&2], 2), 1.71);

        let target = predict::build_target_vector(&meta, vec![(2, 1)], true).unwrap();
        let prediction = predict::predict(&similarity, &target).unwrap();

        let summed = predict::fold_to_item_scores(&prediction, &meta, ScoreReduction::Sum);
        assert_eq!(rounded(summed[&0], 2), 0.71);
        assert_eq!(rounded(summed[&1], 2), 0.5);
    }

    #[test]
    fn prediction_with_mismatching_target() {
        let meta = ColumnMeta::from_slice_lengths(&[1, 1], 10).unwrap();
        let target = predict::build_target_vector(&meta, vec![(0, 1)], true).unwrap();

        assert!(matches!(
            predict::predict(&identity(3), &target),
            Err(RecoError::DimensionMismatch { .. })
        ));
    }
}
