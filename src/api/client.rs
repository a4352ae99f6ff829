//! API Client
//!
//! Resource-oriented wrapper over [`ApiHttpClient`] that knows how to build
//! collection, item, and scoped-children URLs from a base URL.

use super::error::ApiError;
use super::http::ApiHttpClient;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default remote API
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Main REST client
#[derive(Clone)]
pub struct ApiClient {
    pub http: ApiHttpClient,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut normalized = base_url.trim().to_string();
        // Url::join replaces the last segment unless the base ends with '/'
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            http: ApiHttpClient::new(timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    // =========================================================================
    // URL builders
    // =========================================================================

    /// `<base>/<collection>`
    pub fn collection_url(&self, collection: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(collection.trim_matches('/'))?)
    }

    /// `<base>/<collection>/<id>`
    pub fn item_url(&self, collection: &str, id: u64) -> Result<Url, ApiError> {
        let path = format!("{}/{}", collection.trim_matches('/'), id);
        Ok(self.base_url.join(&path)?)
    }

    /// `<base>/<collection>?<parent_field>=<parent_id>[&_limit=<n>]`
    pub fn children_url(
        &self,
        collection: &str,
        parent_field: &str,
        parent_id: u64,
        limit: Option<usize>,
    ) -> Result<Url, ApiError> {
        let mut url = self.collection_url(collection)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(parent_field, &parent_id.to_string());
            if let Some(limit) = limit {
                pairs.append_pair("_limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// GET a full collection array
    pub async fn list(&self, collection: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.collection_url(collection)?;
        expect_array(self.http.get(url.as_str()).await?)
    }

    /// GET the subset of a collection scoped to one parent
    pub async fn list_children(
        &self,
        collection: &str,
        parent_field: &str,
        parent_id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, ApiError> {
        let url = self.children_url(collection, parent_field, parent_id, limit)?;
        expect_array(self.http.get(url.as_str()).await?)
    }

    /// GET a single record
    pub async fn get_one(&self, collection: &str, id: u64) -> Result<Value, ApiError> {
        let url = self.item_url(collection, id)?;
        self.http.get(url.as_str()).await
    }

    /// POST a new record; returns the record echoed by the server
    pub async fn create(&self, collection: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.collection_url(collection)?;
        self.http.post(url.as_str(), body).await
    }

    /// DELETE a record
    pub async fn delete(&self, collection: &str, id: u64) -> Result<(), ApiError> {
        let url = self.item_url(collection, id)?;
        self.http.delete(url.as_str()).await
    }
}

fn expect_array(value: Value) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ApiError::Decode(format!(
            "expected a JSON array, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
