//! Items and Collections
//!
//! An [`Item`] is a loosely typed JSON record with a guaranteed integer id.
//! A [`Collection`] is the in-memory, ordered snapshot of a remote resource
//! set and enforces identifier uniqueness.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Identifier assigned by the remote API
pub type ItemId = u64;

/// One record (post, album, photo, todo, comment)
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub data: Value,
}

impl Item {
    /// Build an item from a JSON record; `None` if it has no integer id
    pub fn from_value(data: Value, id_field: &str) -> Option<Self> {
        let id = data.get(id_field).and_then(Value::as_u64)?;
        Some(Self { id, data })
    }

    /// Field lookup using dot-notation (`address.city`, `tags.0`)
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.data, path)
    }

    /// Display string for a field, `-` when absent
    pub fn text(&self, path: &str) -> String {
        extract_json_value(&self.data, path)
    }

    /// Boolean flag; absent or non-boolean reads as false
    pub fn flag(&self, name: &str) -> bool {
        self.data.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Shallow-merge `patch` into the record. The id is never overwritten.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.data {
            for (key, value) in patch.iter().filter(|(key, _)| *key != "id") {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Reasons a collection refuses an insert
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("item {0} already exists in the collection")]
    DuplicateId(ItemId),
}

/// Ordered in-memory snapshot of a remote collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    items: Vec<Item>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from fetched items, keeping the first occurrence of each id
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert(item.id) {
                kept.push(item);
            } else {
                tracing::warn!("Dropping duplicate item id {}", item.id);
            }
        }
        Self { items: kept }
    }

    /// Replace the whole snapshot
    pub fn replace_all(&mut self, items: Vec<Item>) {
        *self = Self::from_items(items);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|item| item.id)
    }

    /// Append a newly created item at the end
    pub fn append(&mut self, item: Item) -> Result<(), CollectionError> {
        if self.contains(item.id) {
            return Err(CollectionError::DuplicateId(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove one item by id
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Remove every item whose id is in `ids`; returns how many were removed
    pub fn remove_many(&mut self, ids: &HashSet<ItemId>) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }

    /// Merge a partial field set into one item
    pub fn patch(&mut self, id: ItemId, patch: &Map<String, Value>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.merge(patch);
                true
            }
            None => false,
        }
    }
}

fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    match lookup_path(item, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(arr)) => format!("[{} items]", arr.len()),
        Some(Value::Object(_)) => "[object]".to_string(),
        Some(Value::Null) | None => "-".to_string(),
    }
}
