//! CLI module for finrag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// finrag - answers financial questions from trusted web sources
///
/// Searches the web, keeps results from trusted financial-data sites, and
/// answers with a language model grounded on the most relevant passages.
#[derive(Parser, Debug)]
#[command(name = "finrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a financial question
    Ask {
        /// The question to ask
        question: String,

        /// Number of retrieved passages to ground the answer on
        #[arg(short)]
        k: Option<usize>,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show which sources a question would be answered from, without fetching them
    Sources {
        /// The question to search for
        question: String,
    },

    /// Start the HTTP endpoint used by the dashboard
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check API keys and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
