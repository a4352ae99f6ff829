//! Mutation Dispatcher
//!
//! Remote create/delete calls plus the local reconciliation that follows
//! them. Remote calls return plain results; the `apply_*` functions patch
//! the in-memory collection only after a call has resolved.

use crate::api::{ApiClient, ApiError};
use crate::resource::{Collection, CollectionError, CreateDef, Item, ItemId, ResourceDef};
use crate::selection::SelectionSet;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// How bulk delete reconciles when some requests fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BulkDeletePolicy {
    /// Remove exactly the items whose delete succeeded
    #[default]
    PerItem,
    /// Remove nothing unless every delete succeeded
    AllOrNothing,
}

impl BulkDeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerItem => "per-item",
            Self::AllOrNothing => "all-or-nothing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("{0} must not be empty")]
    EmptyInput(String),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Outcome of a bulk delete after reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    /// Ids removed from the local collection
    pub removed: Vec<ItemId>,
    /// Ids whose remote delete failed
    pub failed: Vec<(ItemId, ApiError)>,
    /// Ids whose remote delete succeeded but were kept locally
    pub kept: Vec<ItemId>,
}

impl BulkDeleteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// =========================================================================
// Request bodies
// =========================================================================

/// Build a new record from one line of input and the resource's template
pub fn build_new_record(create: &CreateDef, input: &str) -> Result<Value, MutationError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(MutationError::EmptyInput(create.input_field.clone()));
    }

    let mut body = create.template.clone();
    body.insert(create.input_field.clone(), Value::String(text.to_string()));
    Ok(Value::Object(body))
}

/// Build a comment body scoped to `parent_id`
pub fn build_comment(
    create: &CreateDef,
    parent_field: &str,
    parent_id: ItemId,
    author_name: &str,
    author_email: &str,
    input: &str,
) -> Result<Value, MutationError> {
    let mut body = build_new_record(create, input)?;
    if let Value::Object(map) = &mut body {
        map.insert(parent_field.to_string(), Value::from(parent_id));
        map.insert("name".to_string(), Value::String(author_name.to_string()));
        map.insert("email".to_string(), Value::String(author_email.to_string()));
    }
    Ok(body)
}

// =========================================================================
// Remote calls
// =========================================================================

/// POST a new record; the returned item carries the server-issued id
pub async fn create_item(
    client: &ApiClient,
    resource: &ResourceDef,
    body: &Value,
) -> Result<Item, ApiError> {
    let created = client.create(&resource.path, body).await?;
    Item::from_value(created, &resource.id_field).ok_or_else(|| {
        ApiError::Decode(format!(
            "created {} has no integer '{}'",
            resource.path, resource.id_field
        ))
    })
}

/// DELETE one record
pub async fn delete_item(
    client: &ApiClient,
    resource: &ResourceDef,
    id: ItemId,
) -> Result<(), ApiError> {
    client.delete(&resource.path, id).await
}

/// DELETE many records concurrently and wait for every one to settle
pub async fn delete_items(
    client: &ApiClient,
    resource: &ResourceDef,
    ids: &[ItemId],
) -> Vec<(ItemId, Result<(), ApiError>)> {
    let requests = ids.iter().map(|&id| async move {
        let result = delete_item(client, resource, id).await;
        if let Err(e) = &result {
            tracing::warn!("Delete of {}/{} failed: {}", resource.path, id, e);
        }
        (id, result)
    });

    join_all(requests).await
}

// =========================================================================
// Local reconciliation
// =========================================================================

/// Append a created item
pub fn apply_created(collection: &mut Collection, item: Item) -> Result<ItemId, MutationError> {
    let id = item.id;
    collection.append(item)?;
    Ok(id)
}

/// Remove a deleted item and its selection entry
pub fn apply_deleted(collection: &mut Collection, selection: &mut SelectionSet, id: ItemId) -> bool {
    selection.remove(id);
    collection.remove(id).is_some()
}

/// Reconcile the results of [`delete_items`] under `policy`
pub fn apply_bulk_delete(
    collection: &mut Collection,
    selection: &mut SelectionSet,
    results: Vec<(ItemId, Result<(), ApiError>)>,
    policy: BulkDeletePolicy,
) -> BulkDeleteReport {
    let mut report = BulkDeleteReport::default();
    let mut succeeded = Vec::new();

    for (id, result) in results {
        match result {
            Ok(()) => succeeded.push(id),
            Err(e) => report.failed.push((id, e)),
        }
    }

    if policy == BulkDeletePolicy::AllOrNothing && !report.failed.is_empty() {
        report.kept = succeeded;
        return report;
    }

    let ids: HashSet<ItemId> = succeeded.iter().copied().collect();
    collection.remove_many(&ids);
    for id in &succeeded {
        selection.remove(*id);
    }
    report.removed = succeeded;
    report
}

/// Local-only merge of a partial field set
pub fn update_flag(collection: &mut Collection, id: ItemId, patch: &Map<String, Value>) -> bool {
    collection.patch(id, patch)
}

/// Flip a boolean field locally; returns the new value
pub fn toggle_flag(collection: &mut Collection, id: ItemId, field: &str) -> Option<bool> {
    let current = collection.get(id)?.flag(field);
    let mut patch = Map::new();
    patch.insert(field.to_string(), Value::Bool(!current));
    update_flag(collection, id, &patch).then_some(!current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(ids: &[u64]) -> Collection {
        Collection::from_items(
            ids.iter()
                .map(|&id| Item::from_value(json!({"id": id, "title": format!("t{}", id)}), "id").unwrap())
                .collect(),
        )
    }

    fn create_def() -> CreateDef {
        CreateDef {
            prompt: "New task".to_string(),
            input_field: "title".to_string(),
            template: json!({"completed": false}).as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_delete_removes_item_and_selection() {
        let mut c = collection(&[4, 5, 6]);
        let mut sel = SelectionSet::new();
        sel.select_all([5, 6], true);

        assert!(apply_deleted(&mut c, &mut sel, 5));
        assert_eq!(c.len(), 2);
        assert!(!c.contains(5));
        assert!(!sel.contains(5));
        assert!(sel.contains(6));
    }

    #[test]
    fn test_bulk_delete_all_or_nothing_keeps_everything_on_failure() {
        let mut c = collection(&[1, 2, 3]);
        let mut sel = SelectionSet::new();
        sel.select_all([1, 2, 3], true);

        let results = vec![
            (1, Ok(())),
            (2, Err(ApiError::Status { status: 500 })),
            (3, Ok(())),
        ];
        let report = apply_bulk_delete(&mut c, &mut sel, results, BulkDeletePolicy::AllOrNothing);

        assert_eq!(c.len(), 3);
        assert_eq!(sel.len(), 3);
        assert!(report.removed.is_empty());
        assert_eq!(report.kept, vec![1, 3]);
        assert_eq!(report.failed.len(), 1);
    }

    #[test]
    fn test_bulk_delete_per_item_removes_successes_only() {
        let mut c = collection(&[1, 2, 3]);
        let mut sel = SelectionSet::new();
        sel.select_all([1, 2, 3], true);

        let results = vec![
            (1, Ok(())),
            (2, Err(ApiError::Network("timeout".into()))),
            (3, Ok(())),
        ];
        let report = apply_bulk_delete(&mut c, &mut sel, results, BulkDeletePolicy::PerItem);

        assert_eq!(c.ids().collect::<Vec<_>>(), vec![2]);
        assert_eq!(sel.sorted_ids(), vec![2]);
        assert_eq!(report.removed, vec![1, 3]);
        assert_eq!(report.failed[0].0, 2);
        assert!(!report.is_success());
    }

    #[test]
    fn test_build_new_record_requires_input() {
        let def = create_def();
        assert_eq!(
            build_new_record(&def, "   "),
            Err(MutationError::EmptyInput("title".to_string()))
        );
        let body = build_new_record(&def, "  buy milk ").unwrap();
        assert_eq!(body, json!({"title": "buy milk", "completed": false}));
    }

    #[test]
    fn test_build_comment_sets_parent_and_author() {
        let def = CreateDef {
            prompt: "Add a comment".to_string(),
            input_field: "body".to_string(),
            template: Map::new(),
        };
        let body = build_comment(&def, "postId", 7, "John Doe", "johndoe@example.com", "nice").unwrap();
        assert_eq!(
            body,
            json!({"postId": 7, "name": "John Doe", "email": "johndoe@example.com", "body": "nice"})
        );
    }

    #[test]
    fn test_apply_created_rejects_duplicate() {
        let mut c = collection(&[1]);
        let dup = Item::from_value(json!({"id": 1, "title": "x"}), "id").unwrap();
        assert!(matches!(
            apply_created(&mut c, dup),
            Err(MutationError::Collection(CollectionError::DuplicateId(1)))
        ));
        let fresh = Item::from_value(json!({"id": 201, "title": "x"}), "id").unwrap();
        assert_eq!(apply_created(&mut c, fresh), Ok(201));
    }

    #[test]
    fn test_toggle_flag_is_local() {
        let mut c = collection(&[1]);
        assert_eq!(toggle_flag(&mut c, 1, "completed"), Some(true));
        assert_eq!(toggle_flag(&mut c, 1, "completed"), Some(false));
        assert_eq!(toggle_flag(&mut c, 9, "completed"), None);
    }
}
