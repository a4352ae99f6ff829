//! Resource Registry - Load view definitions from JSON
//!
//! All list views and sub-resources are described in an embedded JSON file,
//! so the three views share one implementation and differ only in data.

use crate::pipeline::{DefaultOrder, SortKey};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource definitions (compiled into the binary)
const RESOURCE_FILE: &str = include_str!("../resources/views.json");

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
}

/// One entry in a view's sort menu
#[derive(Debug, Clone, Deserialize)]
pub struct SortOption {
    pub label: String,
    /// `None` means the resource's default ordering
    #[serde(default)]
    pub field: Option<String>,
}

impl SortOption {
    pub fn key(&self) -> SortKey {
        match &self.field {
            Some(field) => SortKey::Field(field.clone()),
            None => SortKey::Default,
        }
    }
}

/// How to build a new record from one line of user input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDef {
    pub prompt: String,
    /// Field that receives the typed text
    pub input_field: String,
    /// Fixed fields merged into every new record
    #[serde(default)]
    pub template: Map<String, Value>,
}

/// Nested collection shown in the detail panel
#[derive(Debug, Clone, Deserialize)]
pub struct SubResourceDef {
    pub resource_key: String,
    pub display_name: String,
    pub shortcut: String,
    /// Query parameter naming the parent (`postId`, `albumId`)
    pub parent_field: String,
}

/// First-child preview (album cover)
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailDef {
    pub resource_key: String,
    pub parent_field: String,
    pub url_field: String,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub path: String,
    pub id_field: String,
    /// Display field used by the text filter
    pub title_field: String,
    /// Field holding a user id whose name is shown next to the row
    #[serde(default)]
    pub author_field: Option<String>,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub default_order: DefaultOrder,
    #[serde(default)]
    pub sort_options: Vec<SortOption>,
    #[serde(default)]
    pub page_sizes: Vec<usize>,
    /// Local-only boolean toggled from the list (todo completion)
    #[serde(default)]
    pub toggle_field: Option<String>,
    #[serde(default)]
    pub create: Option<CreateDef>,
    #[serde(default)]
    pub sub_resource: Option<SubResourceDef>,
    #[serde(default)]
    pub thumbnail: Option<ThumbnailDef>,
}

impl ResourceDef {
    /// Label of the sort option matching `key`, if any
    pub fn sort_label(&self, key: &SortKey) -> &str {
        self.sort_options
            .iter()
            .find(|opt| &opt.key() == key)
            .map(|opt| opt.label.as_str())
            .unwrap_or("Default")
    }

    /// Sort key following `current` in the sort menu (wraps around)
    pub fn next_sort_key(&self, current: &SortKey) -> SortKey {
        if self.sort_options.is_empty() {
            return SortKey::Default;
        }
        let idx = self
            .sort_options
            .iter()
            .position(|opt| &opt.key() == current)
            .map(|i| (i + 1) % self.sort_options.len())
            .unwrap_or(0);
        self.sort_options[idx].key()
    }

    /// Page size following/preceding `current` among the offered sizes
    pub fn step_page_size(&self, current: usize, forward: bool) -> usize {
        if self.page_sizes.is_empty() {
            return current;
        }
        let pos = self.page_sizes.iter().position(|&s| s == current);
        let idx = match (pos, forward) {
            (Some(i), true) => (i + 1).min(self.page_sizes.len() - 1),
            (Some(i), false) => i.saturating_sub(1),
            (None, _) => 0,
        };
        self.page_sizes[idx]
    }
}

/// Root structure of resources/views.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// Top-level views, in navigation order
    pub views: Vec<String>,
    pub resources: HashMap<String, ResourceDef>,
}

static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (parses the embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(RESOURCE_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e))
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Top-level view keys in navigation order
pub fn view_keys() -> &'static [String] {
    &get_registry().views
}

/// Whether `key` names a top-level view (not a sub-resource)
pub fn is_view(key: &str) -> bool {
    view_keys().iter().any(|v| v == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(!registry.resources.is_empty());
        assert_eq!(registry.views, vec!["posts", "albums", "todos"]);
    }

    #[test]
    fn test_every_view_and_sub_resource_is_defined() {
        for key in view_keys() {
            let def = get_resource(key).expect("view should be defined");
            if let Some(sub) = &def.sub_resource {
                assert!(get_resource(&sub.resource_key).is_some());
            }
            if let Some(thumb) = &def.thumbnail {
                assert!(get_resource(&thumb.resource_key).is_some());
            }
            assert!(!def.page_sizes.is_empty(), "{} needs page sizes", key);
        }
    }

    #[test]
    fn test_todos_default_order_is_completion_flag() {
        let todos = get_resource("todos").unwrap();
        assert_eq!(
            todos.default_order,
            DefaultOrder::Flag {
                field: "completed".to_string()
            }
        );
        assert_eq!(todos.toggle_field.as_deref(), Some("completed"));
    }

    #[test]
    fn test_next_sort_key_wraps() {
        let posts = get_resource("posts").unwrap();
        let title = SortKey::Field("title".to_string());
        assert_eq!(posts.next_sort_key(&SortKey::Default), title);
        assert_eq!(posts.sort_label(&title), "Title");
        let last = posts.sort_options.last().unwrap().key();
        assert_eq!(posts.next_sort_key(&last), SortKey::Default);
    }

    #[test]
    fn test_step_page_size() {
        let todos = get_resource("todos").unwrap();
        assert_eq!(todos.step_page_size(5, true), 10);
        assert_eq!(todos.step_page_size(20, true), 20);
        assert_eq!(todos.step_page_size(5, false), 5);
        assert_eq!(todos.step_page_size(7, true), 5);
    }

    #[test]
    fn test_is_view() {
        assert!(is_view("albums"));
        assert!(!is_view("comments"));
    }
}
