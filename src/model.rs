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

use std::sync::Mutex;
use std::time::Instant;

use fnv::{FnvHashMap, FnvHashSet};
use log::{info, warn};
use scoped_pool::Pool;
use serde_derive::{Deserialize, Serialize};

use crate::cooccurrence::{CooccurrenceEngine, CooccurrenceOptions};
use crate::error::{RecoError, Result};
use crate::expansion::{self, ColumnMeta, ItemSlice};
use crate::index::{self, IndexState};
use crate::matrix::SparseMatrix;
use crate::predict::{self, ScoreReduction};
use crate::source::{Dimension, LoadSource};
use crate::topk::{self, ScoredItem};
use crate::utils;

pub const DEFAULT_MAX_EXPANDED_COLUMNS: usize = 1 << 24;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Normalisation of the co-occurrence matrix
    pub options: CooccurrenceOptions,
    /// Folding of expanded column scores into item scores
    pub reduction: ScoreReduction,
    /// Upper bound for the number of pseudo-unique columns
    pub max_expanded_columns: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            options: CooccurrenceOptions::default(),
            reduction: ScoreReduction::default(),
            max_expanded_columns: DEFAULT_MAX_EXPANDED_COLUMNS,
        }
    }
}

impl ModelConfig {
    pub fn with_options(options: CooccurrenceOptions) -> Self {
        ModelConfig { options, ..Default::default() }
    }
}

/// A recommended item, field names will be used in JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub item: String,
    pub score: f64,
}

/// A loaded co-occurrence model: the index maps, the interaction matrix, its pseudo-unique
/// expansion and the similarity matrix derived from it. Predictions only read the model, so a
/// shared reference can serve concurrent predictions.
#[derive(Clone, Debug)]
pub struct Model {
    config: ModelConfig,
    index: IndexState,
    interactions: SparseMatrix,
    column_meta: ColumnMeta,
    engine: CooccurrenceEngine,
    similarity: SparseMatrix,
}

/// Loads a model from the given source and computes its similarity matrix.
pub fn load(source: LoadSource, config: ModelConfig) -> Result<Model> {

    let (index, interactions) = match source {
        LoadSource::Interactions(mut source) => {
            let interactions = source.fetch_all()?;

            let index = index::build_index(
                &interactions,
                source.distinct_column_count(Dimension::Users),
                source.distinct_column_count(Dimension::Items),
            );

            let mut triplets = Vec::with_capacity(interactions.len());
            for interaction in interactions.iter() {
                if let (Some(user), Some(item)) =
                    (index.user_index(&interaction.user), index.item_index(&interaction.item)) {
                    triplets.push((user as usize, item as usize, interaction.quantity as f64));
                }
            }

            let matrix = SparseMatrix::from_triplets(index.num_users(), index.num_items(), triplets)?;
            (index, matrix)
        },
        LoadSource::Sparse(matrix) => {
            if let Some((row, col, value)) = matrix.nonzero_entries().find(|entry| entry.2 < 0.0) {
                return Err(RecoError::InvalidShape(format!(
                    "negative quantity {} at ({}, {})", value, row, col)));
            }

            let index = IndexState::from_dimensions(
                matrix.num_rows(), matrix.num_cols(), matrix.nonzero_entries().count() as u64);
            (index, matrix)
        },
        LoadSource::Dense(rows) => {
            let rows: Vec<Vec<f64>> = rows.iter()
                .map(|row| row.iter().map(|quantity| *quantity as f64).collect())
                .collect();

            let matrix = SparseMatrix::from_dense(&rows)?;
            let index = IndexState::from_dimensions(
                matrix.num_rows(), matrix.num_cols(), matrix.nnz() as u64);
            (index, matrix)
        },
    };

    info!(
        "Found {} interactions between {} users and {} items.",
        index.num_interactions(),
        index.num_users(),
        index.num_items(),
    );

    Model::build(index, interactions, config)
}

impl Model {

    fn build(index: IndexState, interactions: SparseMatrix, config: ModelConfig) -> Result<Self> {

        let start = Instant::now();

        let (expanded, column_meta) =
            expansion::expand(&interactions, config.max_expanded_columns)?;

        let mut engine = CooccurrenceEngine::new(expanded);
        let similarity = engine.compute(&config.options);

        info!(
            "Built model with {} pseudo-unique columns and {} similarity entries in {}ms",
            column_meta.num_columns(),
            similarity.nnz(),
            utils::to_millis(start.elapsed()),
        );

        Ok(Model { config, index, interactions, column_meta, engine, similarity })
    }

    /// Rebuilds the model from a new source with the current configuration. The model is only
    /// replaced once the new one is complete, on error it stays as it was.
    pub fn reload(&mut self, source: LoadSource) -> Result<()> {
        let reloaded = load(source, self.config)?;
        *self = reloaded;
        Ok(())
    }

    /// Recomputes the similarity matrix with different normalisation options, reusing the
    /// co-occurrence counts.
    pub fn reconfigure(&mut self, options: CooccurrenceOptions) {
        self.similarity = self.engine.compute(&options);
        self.config.options = options;
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexState {
        &self.index
    }

    pub fn column_meta(&self) -> &ColumnMeta {
        &self.column_meta
    }

    pub fn interactions(&self) -> &SparseMatrix {
        &self.interactions
    }

    pub fn expanded(&self) -> &SparseMatrix {
        self.engine.expanded()
    }

    pub fn similarity(&self) -> &SparseMatrix {
        &self.similarity
    }

    fn resolve_target<I, S>(&self, target: I, strict: bool) -> Result<Vec<(u32, u32)>>
        where I: IntoIterator<Item=(S, u32)>, S: AsRef<str> {

        let mut resolved = Vec::new();

        for (item, quantity) in target {
            match self.index.item_index(item.as_ref()) {
                Some(item_index) => resolved.push((item_index, quantity)),
                None if strict => return Err(RecoError::UnknownItem(item.as_ref().to_string())),
                None => warn!("Ignoring unknown item '{}'", item.as_ref()),
            }
        }

        Ok(resolved)
    }

    fn score_items(&self, target: &[(u32, u32)]) -> Result<FnvHashMap<u32, f64>> {
        let target_vector =
            predict::build_target_vector(&self.column_meta, target.iter().cloned(), true)?;
        let prediction = predict::predict(&self.similarity, &target_vector)?;

        Ok(predict::fold_to_item_scores(&prediction, &self.column_meta, self.config.reduction))
    }

    /// Scores items for a user with the given `item -> quantity` interactions. Items scoring 0
    /// are left out. Unknown target items fail in `strict` mode and are ignored otherwise.
    pub fn predict<I, S>(&self, target: I, strict: bool) -> Result<FnvHashMap<String, f64>>
        where I: IntoIterator<Item=(S, u32)>, S: AsRef<str> {

        let resolved = self.resolve_target(target, strict)?;

        let scores = self.score_items(&resolved)?
            .into_iter()
            .map(|(item, score)| (self.index.item_name(item).to_string(), score))
            .collect();

        Ok(scores)
    }

    /// Like `predict`, but with a score for every item of the model.
    pub fn predict_dense<I, S>(&self, target: I, strict: bool) -> Result<FnvHashMap<String, f64>>
        where I: IntoIterator<Item=(S, u32)>, S: AsRef<str> {

        let resolved = self.resolve_target(target, strict)?;
        let item_scores = self.score_items(&resolved)?;

        let scores = self.index.item_names()
            .iter()
            .enumerate()
            .map(|(item, name)| {
                let score = item_scores.get(&(item as u32)).cloned().unwrap_or(0.0);
                (name.clone(), score)
            })
            .collect();

        Ok(scores)
    }

    /// The `k` best scoring items the target has not interacted with yet, best first.
    pub fn recommend<I, S>(&self, target: I, k: usize, strict: bool) -> Result<Vec<Recommendation>>
        where I: IntoIterator<Item=(S, u32)>, S: AsRef<str> {

        let resolved = self.resolve_target(target, strict)?;
        let known: FnvHashSet<u32> = resolved.iter().map(|&(item, _)| item).collect();

        let candidates = self.score_items(&resolved)?
            .into_iter()
            .filter(|&(item, score)| !known.contains(&item) && score > 0.0)
            .map(|(item, score)| ScoredItem { item, score });

        let recommendations = topk::top_k(candidates, k)
            .into_iter()
            .map(|scored_item| Recommendation {
                item: self.index.item_name(scored_item.item).to_string(),
                score: scored_item.score,
            })
            .collect();

        Ok(recommendations)
    }

    /// Computes recommendations for many targets on `pool_size` threads, results are in the
    /// order of the targets.
    pub fn recommend_batch(
        &self,
        targets: &[FnvHashMap<String, u32>],
        k: usize,
        strict: bool,
        pool_size: usize,
    ) -> Result<Vec<Vec<Recommendation>>> {

        let start = Instant::now();

        let slots: Vec<Mutex<Option<Result<Vec<Recommendation>>>>> =
            targets.iter().map(|_| Mutex::new(None)).collect();

        let pool = Pool::new(pool_size.max(1));

        pool.scoped(|scope| {
            for (target, slot) in targets.iter().zip(slots.iter()) {
                scope.execute(move || {
                    let recommendations = self.recommend(
                        target.iter().map(|(item, quantity)| (item, *quantity)),
                        k,
                        strict,
                    );

                    let mut slot = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    *slot = Some(recommendations);
                });
            }
        });

        pool.shutdown();

        info!(
            "Computed recommendations for {} targets in {}ms",
            targets.len(),
            utils::to_millis(start.elapsed()),
        );

        slots.into_iter()
            .map(|slot| {
                slot.into_inner()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .unwrap_or_else(|| Ok(Vec::new()))
            })
            .collect()
    }

    /// The `item -> quantity` interactions of every user, in user index order.
    pub fn user_histories(&self) -> Vec<(String, FnvHashMap<String, u32>)> {

        let mut histories: Vec<FnvHashMap<String, u32>> =
            vec![FnvHashMap::default(); self.index.num_users()];

        for (user, item, quantity) in self.interactions.nonzero_entries() {
            histories[user].insert(
                self.index.item_name(item as u32).to_string(),
                expansion::to_units(quantity),
            );
        }

        self.index.user_names()
            .iter()
            .cloned()
            .zip(histories.into_iter())
            .collect()
    }

    /// A snapshot of the model contents for diagnostics. The layout is not a stable format.
    pub fn dump(&self) -> ModelSnapshot {
        ModelSnapshot {
            config: self.config,
            users: self.index.user_names().to_vec(),
            items: self.index.item_names().to_vec(),
            item_slices: self.column_meta.slices().to_vec(),
            interactions: MatrixSnapshot::from(&self.interactions),
            expanded: MatrixSnapshot::from(self.engine.expanded()),
            similarity: MatrixSnapshot::from(&self.similarity),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MatrixSnapshot {
    pub num_rows: usize,
    pub num_cols: usize,
    pub entries: Vec<(usize, usize, f64)>,
}

impl<'a> From<&'a SparseMatrix> for MatrixSnapshot {
    fn from(matrix: &'a SparseMatrix) -> Self {
        MatrixSnapshot {
            num_rows: matrix.num_rows(),
            num_cols: matrix.num_cols(),
            entries: matrix.to_triplets(),
        }
    }
}

/// Users and items in index order together with the matrices of a model.
#[derive(Clone, Debug, Serialize)]
pub struct ModelSnapshot {
    pub config: ModelConfig,
    pub users: Vec<String>,
    pub items: Vec<String>,
    pub item_slices: Vec<ItemSlice>,
    pub interactions: MatrixSnapshot,
    pub expanded: MatrixSnapshot,
    pub similarity: MatrixSnapshot,
}

impl ModelSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
