//! Selection Tracker
//!
//! Set of item ids marked for bulk operations. Always kept a subset of the
//! live collection.

use crate::resource::{Collection, ItemId};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<ItemId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership; returns whether `id` is now selected
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Select every id in `ids` when `flag` is true, otherwise clear
    pub fn select_all<I>(&mut self, ids: I, flag: bool)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids.clear();
        if flag {
            self.ids.extend(ids);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: ItemId) {
        self.ids.remove(&id);
    }

    /// Drop ids that no longer exist in `collection`
    pub fn retain_live(&mut self, collection: &Collection) {
        self.ids.retain(|id| collection.contains(*id));
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order
    pub fn sorted_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
