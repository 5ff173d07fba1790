//! Sources command: discovery and trust filtering without fetching.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Discovery, SourceDiscovery};
use crate::query::Query;
use anyhow::Result;

/// Run the sources command.
pub async fn run_sources(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Sources, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'finrag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let query = Query::new(question)?;
    let discovery = SourceDiscovery::from_settings(&settings)?;

    let spinner = Output::spinner("Searching...");
    let result = discovery.discover(&query).await;
    spinner.finish_and_clear();
    let Discovery {
        discovered,
        trusted,
    } = result?;

    Output::header(&format!(
        "{} of {} results are trusted",
        trusted.len(),
        discovered.len()
    ));
    for url in &discovered {
        if trusted.contains(url) {
            Output::list_item(url);
        } else {
            println!("    {}", console::style(url).dim());
        }
    }

    if trusted.is_empty() {
        Output::warning("No trusted sources; an answer would not be grounded.");
    }

    Ok(())
}
