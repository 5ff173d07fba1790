//! Configuration settings for finrag.

use crate::error::{FinragError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Domains trusted for financial data unless the config overrides them.
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "tradingview.com",
    "moneycontrol.com",
    "groww.in",
    "angelone.in",
    "dhan.co",
    "nse",
    "screener.in",
];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub search: SearchSettings,
    pub trust: TrustSettings,
    pub loader: LoaderSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub timeouts: TimeoutSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// Web discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search provider (google).
    pub provider: String,
    /// Endpoint of the Programmable Search JSON API.
    pub endpoint: String,
    /// API key. Falls back to `GOOGLE_API_KEY`.
    pub api_key: Option<String>,
    /// Search engine id (cx). Falls back to `GOOGLE_CSE_ID`.
    pub engine_id: Option<String>,
    /// Maximum number of URLs to discover per query.
    pub result_limit: usize,
    /// Pause between result page requests, in milliseconds.
    pub pause_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key: None,
            engine_id: None,
            result_limit: 15,
            pause_ms: 1000,
        }
    }
}

impl SearchSettings {
    /// Resolve the API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
    }

    /// Resolve the search engine id from config or environment.
    pub fn resolved_engine_id(&self) -> Option<String> {
        self.engine_id
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_CSE_ID").ok().filter(|k| !k.is_empty()))
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Source trust settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustSettings {
    /// Substrings a discovered URL must contain to be loaded.
    pub domains: Vec<String>,
}

impl Default for TrustSettings {
    fn default() -> Self {
        Self {
            domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Document loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Maximum concurrent page fetches.
    pub max_concurrent: usize,
    /// User-Agent header sent with page requests.
    pub user_agent: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            user_agent: concat!("finrag/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_size: usize,
    /// Characters repeated from the end of the previous chunk.
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 0,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Maximum concurrent embedding calls.
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            max_concurrent: 4,
        }
    }
}

/// Similarity retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the answer model.
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 1 }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.3,
        }
    }
}

/// Per-call deadlines for external services, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub discovery_secs: u64,
    pub fetch_secs: u64,
    pub embed_secs: u64,
    pub generate_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            discovery_secs: 30,
            fetch_secs: 20,
            embed_secs: 30,
            generate_secs: 120,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_size == 0 {
            return Err(FinragError::Config("chunking.max_size must be at least 1".to_string()));
        }
        if self.chunking.overlap >= self.chunking.max_size {
            return Err(FinragError::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.chunking.overlap, self.chunking.max_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(FinragError::Config("retrieval.k must be at least 1".to_string()));
        }
        if self.loader.max_concurrent == 0 || self.embedding.max_concurrent == 0 {
            return Err(FinragError::Config(
                "loader.max_concurrent and embedding.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FinragError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("finrag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
