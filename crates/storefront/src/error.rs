//! Unified error handling for storefront client operations.
//!
//! Every network and storage operation returns `Result<T, StorefrontError>`.
//! Callers decide how to degrade: the cart stores log and keep a stale or
//! empty view rather than propagating.

use thiserror::Error;

/// Longest response body excerpt kept in an error.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the shop or the local store.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// HTTP transport failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl StorefrontError {
    /// Build a status error keeping only the head of the body.
    #[must_use]
    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
