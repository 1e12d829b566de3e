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

use crate::error::Result;
use crate::matrix::SparseMatrix;
use crate::types::Interaction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Users,
    Items,
}

/// Provider of the historical interactions a model is loaded from, e.g. a table in a
/// relational store or a file.
pub trait InteractionSource {

    /// Reads all interactions. Called once per load.
    fn fetch_all(&mut self) -> Result<Vec<Interaction>>;

    /// Number of distinct users or items, if the source knows it cheaply.
    fn distinct_column_count(&self, _dimension: Dimension) -> Option<usize> {
        None
    }
}

impl InteractionSource for Vec<Interaction> {

    fn fetch_all(&mut self) -> Result<Vec<Interaction>> {
        Ok(self.clone())
    }
}

/// Input a model can be loaded from.
pub enum LoadSource {
    /// Interactions with external user and item identifiers
    Interactions(Box<dyn InteractionSource>),
    /// A prebuilt `users x items` quantity matrix, users and items are named by index
    Sparse(SparseMatrix),
    /// Dense `users x items` quantities, users and items are named by index
    Dense(Vec<Vec<u32>>),
}

impl LoadSource {

    pub fn from_interactions<S: InteractionSource + 'static>(source: S) -> Self {
        LoadSource::Interactions(Box::new(source))
    }
}
