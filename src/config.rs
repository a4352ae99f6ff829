//! Configuration Management
//!
//! Persistent settings for tplace, stored as JSON in the user config dir.

use crate::api::DEFAULT_BASE_URL;
use crate::mutation::BulkDeletePolicy;
use crate::view_state::DEFAULT_PAGE_SIZE;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name and email attached to comments posted from the detail panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub name: String,
    pub email: String,
}

impl Default for CommentAuthor {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            email: "johndoe@example.com".to_string(),
        }
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// API root, e.g. a local json-server
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Last viewed list
    #[serde(default)]
    pub last_view: Option<String>,
    #[serde(default)]
    pub bulk_delete: BulkDeletePolicy,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub comment_author: CommentAuthor,
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tplace").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// CLI > config > default
    pub fn effective_base_url(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// CLI > config > default
    pub fn effective_page_size(&self, cli: Option<usize>) -> usize {
        cli.or(self.page_size).unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    /// CLI > config > first registered view, ignoring unknown names
    pub fn effective_view(&self, cli: Option<&str>) -> String {
        cli.filter(|v| crate::resource::is_view(v))
            .or_else(|| {
                self.last_view
                    .as_deref()
                    .filter(|v| crate::resource::is_view(v))
            })
            .map(str::to_string)
            .or_else(|| crate::resource::view_keys().first().cloned())
            .unwrap_or_else(|| "posts".to_string())
    }

    pub fn effective_bulk_delete(&self, cli: Option<BulkDeletePolicy>) -> BulkDeletePolicy {
        cli.unwrap_or(self.bulk_delete)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    /// Set last view and save
    pub fn set_last_view(&mut self, view: &str) -> Result<()> {
        self.last_view = Some(view.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_base_url(None), DEFAULT_BASE_URL);
        assert_eq!(config.effective_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(config.effective_bulk_delete(None), BulkDeletePolicy::PerItem);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.comment_author.name, "John Doe");
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            base_url: Some("http://localhost:3000".to_string()),
            page_size: Some(20),
            bulk_delete: BulkDeletePolicy::AllOrNothing,
            ..Default::default()
        };
        assert_eq!(config.effective_base_url(None), "http://localhost:3000");
        assert_eq!(config.effective_base_url(Some("http://x")), "http://x");
        assert_eq!(config.effective_page_size(Some(50)), 50);
        assert_eq!(config.effective_page_size(None), 20);
        assert_eq!(
            config.effective_bulk_delete(Some(BulkDeletePolicy::PerItem)),
            BulkDeletePolicy::PerItem
        );
    }

    #[test]
    fn test_unknown_view_falls_back() {
        let config = Config {
            last_view: Some("todos".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_view(Some("users")), "todos");
        assert_eq!(config.effective_view(Some("albums")), "albums");
        assert_eq!(Config::default().effective_view(None), "posts");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{"last_view": "albums", "bulk_delete": "all-or-nothing"}"#);
        assert_eq!(config.last_view.as_deref(), Some("albums"));
        assert_eq!(config.bulk_delete, BulkDeletePolicy::AllOrNothing);
        assert_eq!(config.comment_author, CommentAuthor::default());

        assert_eq!(Config::from_json("not json"), Config::default());
    }
}
