//! finrag - web-grounded answers to financial questions
//!
//! Each question is answered from scratch: a web search finds candidate
//! pages, only pages on trusted financial-data sites are loaded, their text is
//! chunked and embedded into a throwaway index, and the most similar passages
//! ground a language model's answer.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `query` - The validated question
//! - `search` - Web discovery
//! - `trust` - Domain allow-list filtering
//! - `loader` - Page fetching and text extraction
//! - `chunking` - Splitting documents into bounded passages
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-request similarity index
//! - `rag` - Prompt building and answer synthesis
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use finrag::config::Settings;
//! use finrag::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load_from(None)?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let answer = orchestrator.answer("What is the P/E ratio of TCS?").await?;
//!     println!("{}", answer.text);
//!     for source in &answer.sources {
//!         println!("  {} (score: {:.2})", source.chunk.source_url, source.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod openai;
pub mod orchestrator;
pub mod query;
pub mod rag;
pub mod search;
pub mod trust;
pub mod vector_store;

pub use error::{FinragError, Result};
