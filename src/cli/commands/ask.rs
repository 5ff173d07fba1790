//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, PipelineOutcome};
use crate::query::Query;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    k: Option<usize>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'finrag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(k) = k {
        settings.retrieval.k = k;
    }
    if let Some(model) = model {
        settings.generation.model = model;
    }
    settings.validate()?;

    let query = Query::new(question)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching trusted sources...");
    let report = orchestrator.run(&query).await;
    spinner.finish_and_clear();

    let stats = &report.stats;
    match report.outcome {
        PipelineOutcome::Completed(answer) => {
            println!("\n{}\n", answer.text.trim());

            Output::header("Sources");
            Output::kv(
                "Trusted",
                &format!("{} of {} search results", stats.trusted, stats.discovered),
            );
            Output::kv(
                "Indexed",
                &format!("{} chunks from {} pages", stats.embedded, stats.documents),
            );
            if answer.sources.is_empty() {
                Output::warning("No trusted context was found; the answer is not grounded.");
            }
            for (i, source) in answer.sources.iter().enumerate() {
                let chunk = &source.chunk;
                Output::source(i + 1, &chunk.source_url, source.score, &chunk.content);
            }
            Ok(())
        }
        PipelineOutcome::Failed { stage, error } => {
            Output::error(&format!("Failed while {}: {}", stage, error));
            Err(error.into())
        }
    }
}
