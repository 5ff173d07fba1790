//! HTTP endpoint for the web dashboard.
//!
//! `GET /?msg=<question>` answers in plain text. `GET /health` reports liveness.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, PipelineOutcome};
use crate::query::Query;
use axum::{
    extract::{Query as Params, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Build the router around a ready orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ask))
        .route("/health", get(health))
        .layer(cors)
        .with_state(orchestrator)
}

/// Run the HTTP server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Arc::new(Orchestrator::new(settings)?);
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("finrag server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Ask", "GET /?msg=<question>");
    Output::kv("Health", "GET /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[derive(Deserialize)]
struct AskParams {
    msg: Option<String>,
}

async fn health() -> &'static str {
    "ok"
}

async fn ask(
    State(orchestrator): State<Arc<Orchestrator>>,
    Params(params): Params<AskParams>,
) -> (StatusCode, String) {
    let query = match params.msg.as_deref().map(Query::new) {
        Some(Ok(query)) => query,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "Missing question: pass it as ?msg=<question>".to_string(),
            )
        }
    };

    info!(query_id = %query.id(), "Question received");

    match orchestrator.run(&query).await.outcome {
        PipelineOutcome::Completed(answer) => (StatusCode::OK, answer.text),
        PipelineOutcome::Failed { stage, error } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not answer the question (failed while {}): {}", stage, error),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::Embedder;
    use crate::error::{FinragError, Result};
    use crate::loader::PageFetcher;
    use crate::rag::{GenerationRequest, LanguageModel};
    use crate::search::WebSearch;
    use async_trait::async_trait;

    struct NoResults;

    #[async_trait]
    impl WebSearch for NoResults {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl PageFetcher for NoResults {
        async fn fetch(&self, url: &str) -> Result<String> {
            Err(FinragError::fetch(url, "unreachable"))
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
    }

    struct EchoModel {
        fail: bool,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            if self.fail {
                return Err(FinragError::OpenAI("model overloaded".to_string()));
            }
            Ok(format!("Answer to: {}", request.user))
        }
    }

    async fn spawn_server(fail_model: bool) -> String {
        let orchestrator = Orchestrator::with_components(
            &Settings::default(),
            Prompts::default(),
            Arc::new(NoResults),
            Arc::new(NoResults),
            Arc::new(UnitEmbedder),
            Arc::new(EchoModel { fail: fail_model }),
        );
        let app = router(Arc::new(orchestrator));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_answer_is_plain_text() {
        let base = spawn_server(false).await;

        let response = reqwest::get(format!("{}/?msg=What%20is%20the%20P%2FE%20of%20TCS%3F", base))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(response.text().await.unwrap(), "Answer to: What is the P/E of TCS?");
    }

    #[tokio::test]
    async fn test_missing_or_blank_msg_is_bad_request() {
        let base = spawn_server(false).await;

        let missing = reqwest::get(format!("{}/", base)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);

        let blank = reqwest::get(format!("{}/?msg=%20%20", base)).await.unwrap();
        assert_eq!(blank.status(), reqwest::StatusCode::BAD_REQUEST);
        assert!(!blank.text().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_server_error_with_reason() {
        let base = spawn_server(true).await;

        let response = reqwest::get(format!("{}/?msg=TCS", base)).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.text().await.unwrap();
        assert!(body.contains("synthesizing"));
        assert!(body.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_server(false).await;
        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }
}
