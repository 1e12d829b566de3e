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

use crate::types::Interaction;

/// Mapping between external user/item identifiers and consecutive integer indices, plus basic
/// statistics of the data it was built from. Indices are handed out in order of first
/// appearance, callers should not rely on any particular assignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexState {
    user_dict: FnvHashMap<String, u32>,
    item_dict: FnvHashMap<String, u32>,
    user_names: Vec<String>,
    item_names: Vec<String>,
    num_interactions: u64,
}

impl IndexState {

    /// Names users and items by their decimal index, used for inputs that come without
    /// identifiers.
    pub fn from_dimensions(num_users: usize, num_items: usize, num_interactions: u64) -> Self {
        let mut index = IndexState::with_capacity(num_users, num_items);

        for user in 0..num_users {
            index.insert_user(&user.to_string());
        }

        for item in 0..num_items {
            index.insert_item(&item.to_string());
        }

        index.num_interactions = num_interactions;
        index
    }

    fn with_capacity(num_users: usize, num_items: usize) -> Self {
        IndexState {
            user_dict: FnvHashMap::with_capacity_and_hasher(num_users, Default::default()),
            item_dict: FnvHashMap::with_capacity_and_hasher(num_items, Default::default()),
            user_names: Vec::with_capacity(num_users),
            item_names: Vec::with_capacity(num_items),
            num_interactions: 0,
        }
    }

    fn insert_user(&mut self, user: &str) -> u32 {
        if let Some(index) = self.user_dict.get(user) {
            return *index;
        }

        let index = self.user_names.len() as u32;
        self.user_dict.insert(user.to_string(), index);
        self.user_names.push(user.to_string());
        index
    }

    fn insert_item(&mut self, item: &str) -> u32 {
        if let Some(index) = self.item_dict.get(item) {
            return *index;
        }

        let index = self.item_names.len() as u32;
        self.item_dict.insert(item.to_string(), index);
        self.item_names.push(item.to_string());
        index
    }

    pub fn num_users(&self) -> usize {
        self.user_names.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_names.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn user_index(&self, name: &str) -> Option<u32> {
        self.user_dict.get(name).cloned()
    }

    pub fn item_index(&self, name: &str) -> Option<u32> {
        self.item_dict.get(name).cloned()
    }

    pub fn user_name(&self, user_index: u32) -> &str {
        &self.user_names[user_index as usize]
    }

    pub fn item_name(&self, item_index: u32) -> &str {
        &self.item_names[item_index as usize]
    }

    /// User names in index order.
    pub fn user_names(&self) -> &[String] {
        &self.user_names
    }

    /// Item names in index order.
    pub fn item_names(&self) -> &[String] {
        &self.item_names
    }
}

/// Enumerates the distinct users and items of the interactions. The capacity hints only
/// pre-size the maps.
pub fn build_index<'a, I>(
    interactions: I,
    user_capacity: Option<usize>,
    item_capacity: Option<usize>,
) -> IndexState
    where I: IntoIterator<Item=&'a Interaction> {

    let mut index = IndexState::with_capacity(
        user_capacity.unwrap_or(100),
        item_capacity.unwrap_or(100),
    );

    for interaction in interactions {
        index.insert_user(&interaction.user);
        index.insert_item(&interaction.item);
        index.num_interactions += 1;
    }

    index
}


#[cfg(test)]
mod tests {

    use crate::index::{self, IndexState};
    use crate::types::Interaction;

    #[test]
    fn indices_are_consecutive() {
        let interactions = vec![
            Interaction::new("alice", "apple", 1),
            Interaction::new("alice", "dog", 2),
            Interaction::new("bob", "apple", 1),
            Interaction::new("charles", "bike", 0),
        ];

        let index = index::build_index(&interactions, None, Some(3));

        assert_eq!(index.num_users(), 3);
        assert_eq!(index.num_items(), 3);
        assert_eq!(index.num_interactions(), 4);

        for name in &["apple", "dog", "bike"] {
            let item_index = index.item_index(name).unwrap();
            assert!(item_index < 3);
            assert_eq!(index.item_name(item_index), *name);
        }

        let bob = index.user_index("bob").unwrap();
        assert_eq!(index.user_name(bob), "bob");
        assert_eq!(index.user_index("dora"), None);
        assert_eq!(index.item_index("pony"), None);
    }

    #[test]
    fn names_from_dimensions() {
        let index = IndexState::from_dimensions(2, 3, 5);

        assert_eq!(index.user_names(), &["0".to_string(), "1".to_string()]);
        assert_eq!(index.item_index("2"), Some(2));
        assert_eq!(index.item_name(1), "1");
        assert_eq!(index.num_interactions(), 5);
    }
}
