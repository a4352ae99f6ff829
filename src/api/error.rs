//! API Errors
//!
//! Typed failures for remote calls. Every fetch and mutation returns
//! `Result<_, ApiError>` so callers decide how to surface the failure.

use thiserror::Error;

/// Broad category of an API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Status,
    Decode,
    InvalidUrl,
}

/// Error returned by the REST layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("Failed to send request: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("API request failed: {status}")]
    Status { status: u16 },

    /// The response body was not the JSON we expected
    #[error("Failed to parse response JSON: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Status { .. } => ErrorKind::Status,
            Self::Decode(_) => ErrorKind::Decode,
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
        }
    }

    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status } => matches!(status, 408 | 429) || *status >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
            };
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Format an API error for display in the footer or a notification
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Status { status: 404 } => "Resource not found.".to_string(),
        ApiError::Status { status: 429 } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ApiError::Status { status: 400 } => "Invalid request. Check your input.".to_string(),
        ApiError::Status { status } if *status >= 500 => {
            "Service temporarily unavailable. Please try again.".to_string()
        }
        ApiError::Status { status } => format!("Request failed with status {}.", status),
        ApiError::Network(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ApiError::Decode(_) => "Unexpected response from server.".to_string(),
        ApiError::InvalidUrl(url) => {
            let shown: String = url.chars().take(60).collect();
            format!("Invalid URL: {}", shown)
        }
    }
}
