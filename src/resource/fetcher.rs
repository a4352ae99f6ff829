//! Resource Fetcher
//!
//! Loads collections, scoped children, thumbnails, and authors from the
//! remote API and turns raw JSON records into [`Item`]s.

use super::model::Item;
use super::registry::{ResourceDef, SubResourceDef, ThumbnailDef};
use crate::api::{ApiClient, ApiError};
use serde_json::Value;

/// Fetch the full collection for a resource (no server-side paging)
pub async fn fetch_collection(
    client: &ApiClient,
    resource: &ResourceDef,
) -> Result<Vec<Item>, ApiError> {
    let raw = client.list(&resource.path).await?;
    let items = into_items(raw, &resource.id_field);
    tracing::info!("Fetched {} {}", items.len(), resource.path);
    Ok(items)
}

/// Fetch every child of `parent_id` for a sub-resource
pub async fn fetch_children(
    client: &ApiClient,
    sub: &SubResourceDef,
    child: &ResourceDef,
    parent_id: u64,
) -> Result<Vec<Item>, ApiError> {
    let raw = client
        .list_children(&child.path, &sub.parent_field, parent_id, None)
        .await?;
    Ok(into_items(raw, &child.id_field))
}

/// Fetch the first child's preview URL (`_limit=1`)
pub async fn fetch_thumbnail(
    client: &ApiClient,
    thumb: &ThumbnailDef,
    child: &ResourceDef,
    parent_id: u64,
) -> Result<Option<String>, ApiError> {
    let raw = client
        .list_children(&child.path, &thumb.parent_field, parent_id, Some(1))
        .await?;

    Ok(raw
        .first()
        .and_then(|photo| photo.get(&thumb.url_field))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Fetch a user's display name
pub async fn fetch_user_name(
    client: &ApiClient,
    users: &ResourceDef,
    user_id: u64,
) -> Result<String, ApiError> {
    let user = client.get_one(&users.path, user_id).await?;
    user.get(&users.title_field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode(format!("user {} has no {}", user_id, users.title_field)))
}

/// Convert raw records to items, dropping any without an integer id
pub fn into_items(raw: Vec<Value>, id_field: &str) -> Vec<Item> {
    let total = raw.len();
    let items: Vec<Item> = raw
        .into_iter()
        .filter_map(|value| Item::from_value(value, id_field))
        .collect();

    if items.len() < total {
        tracing::warn!(
            "Dropped {} records without an integer '{}'",
            total - items.len(),
            id_field
        );
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_items_skips_records_without_id() {
        let raw = vec![
            json!({"id": 1, "title": "a"}),
            json!({"title": "orphan"}),
            json!({"id": 2, "title": "b"}),
        ];
        let items = into_items(raw, "id");
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
