//! Error types for finrag.

use thiserror::Error;

/// Library-level error type for finrag operations.
#[derive(Error, Debug)]
pub enum FinragError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Web discovery failed: {0}")]
    Discovery(String),

    #[error("Document fetch failed for {url}: {reason}")]
    DocumentFetch { url: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Query embedding failed: {0}")]
    QueryEmbedding(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FinragError {
    /// Build a per-URL fetch error.
    pub fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        FinragError::DocumentFetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for finrag operations.
pub type Result<T> = std::result::Result<T, FinragError>;

/// Run `future` under a deadline, mapping expiry to [`FinragError::Timeout`].
pub async fn with_timeout<T, F>(
    operation: &str,
    limit: std::time::Duration,
    future: F,
) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(FinragError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}
