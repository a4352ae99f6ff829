//! Resource abstraction layer
//!
//! Views are data-driven: every list view and sub-resource is described in
//! `src/resources/views.json`, so adding a collection needs no code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`fetcher`] - Fetches collections, children, thumbnails, and authors
//! - [`model`] - `Item` records and the id-unique `Collection`

mod fetcher;
pub mod model;
mod registry;

pub use fetcher::{fetch_children, fetch_collection, fetch_thumbnail, fetch_user_name, into_items};
pub use model::{extract_json_value, Collection, CollectionError, Item, ItemId};
pub use registry::*;
