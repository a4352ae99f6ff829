//! Remote REST API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - Resource-oriented client (collections, items, scoped children)
//! - [`http`] - HTTP utilities for JSON requests
//! - [`error`] - Typed API failures and user-facing formatting
//!
//! # Example
//!
//! ```ignore
//! use tplace::api::ApiClient;
//!
//! async fn example() -> Result<(), tplace::api::ApiError> {
//!     let client = ApiClient::new("https://jsonplaceholder.typicode.com", Duration::from_secs(10))?;
//!     let posts = client.list("posts").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{format_api_error, ApiError, ErrorKind};
