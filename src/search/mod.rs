//! Web discovery: turning a question into candidate source URLs.

mod google;

pub use google::GoogleSearch;

use crate::config::SearchSettings;
use crate::error::{FinragError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for web search providers.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Return up to `limit` result URLs for `query`, in the provider's ranking order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Create the search client named by the settings.
pub fn create_search(settings: &SearchSettings) -> Result<Arc<dyn WebSearch>> {
    match settings.provider.to_lowercase().as_str() {
        "google" => Ok(Arc::new(GoogleSearch::from_settings(settings)?)),
        other => Err(FinragError::Config(format!("Unknown search provider: {}", other))),
    }
}
