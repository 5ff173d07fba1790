//! Document loading: fetching trusted pages and reducing them to plain text.

mod http;

pub use http::HttpPageFetcher;

use crate::error::{with_timeout, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Plain text extracted from one fetched URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// URL the text was fetched from.
    pub source_url: String,
    /// Extracted text content.
    pub content: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(source_url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            content: content.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Trait for fetching a URL and extracting its text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its readable text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Outcome of loading a batch of URLs.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Documents with non-empty text, in input URL order.
    pub documents: Vec<RawDocument>,
    /// URLs that were skipped, with the reason.
    pub errors: Vec<(String, String)>,
}

/// Loads documents concurrently, skipping URLs that fail.
pub struct DocumentLoader {
    fetcher: Arc<dyn PageFetcher>,
    max_concurrent: usize,
    timeout: Duration,
}

impl DocumentLoader {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            max_concurrent: 4,
            timeout: Duration::from_secs(20),
        }
    }

    /// Set the maximum number of in-flight fetches.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the per-URL deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch every URL. Failures and empty pages are dropped, never fatal.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn load(&self, urls: &[String]) -> LoadResult {
        if urls.is_empty() {
            return LoadResult::default();
        }

        let mut fetched: Vec<(usize, String, Result<String>)> =
            stream::iter(urls.iter().cloned().enumerate())
                .map(|(idx, url)| async move {
                    let result = with_timeout(
                        &format!("fetch {}", url),
                        self.timeout,
                        self.fetcher.fetch(&url),
                    )
                    .await;
                    (idx, url, result)
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        fetched.sort_by_key(|(idx, _, _)| *idx);

        let mut result = LoadResult::default();
        for (_, url, outcome) in fetched {
            match outcome {
                Ok(text) if text.trim().is_empty() => {
                    warn!("No text extracted from {}, skipping", url);
                    result.errors.push((url, "no text content".to_string()));
                }
                Ok(text) => {
                    debug!("Loaded {} characters from {}", text.chars().count(), url);
                    result.documents.push(RawDocument::new(url, text));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    result.errors.push((url, e.to_string()));
                }
            }
        }

        info!(
            "Loaded {} documents ({} skipped)",
            result.documents.len(),
            result.errors.len()
        );
        result
    }
}
