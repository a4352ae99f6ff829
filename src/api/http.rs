//! HTTP utilities for REST API calls

use super::error::ApiError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Content type sent with every JSON request body
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Truncate a response body and strip control characters before logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LOG_BODY_LENGTH)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(char::is_control, "")
}

/// HTTP client wrapper for JSON REST calls
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    /// Create a new HTTP client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("tplace/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request and parse the JSON body
    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("POST {}", url);

        let payload = serde_json::to_vec(body)?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Make a DELETE request; the response body is not required
    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        tracing::debug!("DELETE {}", url);

        let response = self.client.delete(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Invalid JSON body: {} - {}", e, sanitize_for_log(&body));
            ApiError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }
}
