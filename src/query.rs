//! The user's question as accepted by the pipeline.

use crate::error::{FinragError, Result};
use std::fmt;
use uuid::Uuid;

/// A validated, immutable question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    id: Uuid,
    text: String,
}

impl Query {
    /// Accept a question. Blank input is rejected.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FinragError::InvalidInput("Query must not be empty".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            text: trimmed.to_string(),
        })
    }

    /// Request id used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
