//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are available before starting a request
//! that would otherwise fail at its first external call.

use crate::config::Settings;
use crate::error::{FinragError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs search and OpenAI credentials.
    Ask,
    /// Listing sources needs search credentials only.
    Sources,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_search_credentials(settings)?;
    match operation {
        Operation::Ask => check_openai_key(),
        Operation::Sources => Ok(()),
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(FinragError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(FinragError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the search provider can be called.
fn check_search_credentials(settings: &Settings) -> Result<()> {
    if settings.search.resolved_api_key().is_none() {
        return Err(FinragError::Config(
            "Search API key not set. Set search.api_key or export GOOGLE_API_KEY".to_string(),
        ));
    }
    if settings.search.resolved_engine_id().is_none() {
        return Err(FinragError::Config(
            "Search engine id not set. Set search.engine_id or export GOOGLE_CSE_ID".to_string(),
        ));
    }
    Ok(())
}
