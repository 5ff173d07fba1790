//! Answer synthesis over retrieved context.

use super::context::format_context_for_prompt;
use super::{Answer, GenerationRequest, LanguageModel};
use crate::config::{GenerationSettings, Prompts};
use crate::error::{with_timeout, FinragError, Result};
use crate::query::Query;
use crate::vector_store::RetrievedChunk;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Builds the grounded prompt and asks the language model for an answer.
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        let defaults = GenerationSettings::default();
        Self {
            model,
            prompts: Prompts::default(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: Duration::from_secs(120),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Apply output length and temperature from settings.
    pub fn with_settings(mut self, settings: &GenerationSettings) -> Self {
        self.max_tokens = settings.max_tokens;
        self.temperature = settings.temperature;
        self
    }

    /// Set the deadline for the generation call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render the generation request for `query` over `context`.
    pub fn build_request(&self, query: &Query, context: &[RetrievedChunk]) -> GenerationRequest {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), query.text().to_string());
        vars.insert("context".to_string(), format_context_for_prompt(context));

        GenerationRequest {
            system: self.prompts.render_with_custom(&self.prompts.answer.system, &vars),
            user: self.prompts.render_with_custom(&self.prompts.answer.user, &vars),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Generate an answer. Empty context still goes to the model.
    #[instrument(
        skip(self, query, context),
        fields(query_id = %query.id(), sources = context.len())
    )]
    pub async fn synthesize(&self, query: &Query, context: Vec<RetrievedChunk>) -> Result<Answer> {
        if context.is_empty() {
            info!("No retrieved context; asking the model without grounding");
        }

        let request = self.build_request(query, &context);
        debug!("System prompt is {} characters", request.system.len());

        let text = with_timeout("generate answer", self.timeout, self.model.generate(&request))
            .await
            .map_err(|e| match e {
                FinragError::Synthesis(_) => e,
                other => FinragError::Synthesis(other.to_string()),
            })?;

        if text.trim().is_empty() {
            return Err(FinragError::Synthesis(
                "Language model returned an empty answer".to_string(),
            ));
        }

        Ok(Answer {
            text,
            sources: context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and replies with a fixed result.
    struct RecordingModel {
        reply: std::result::Result<String, String>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl RecordingModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .clone()
                .map_err(FinragError::OpenAI)
        }
    }

    fn retrieved(content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                document_index: 0,
                source_url: "https://screener.in/company/TCS/".to_string(),
                order: 0,
                position: 0,
                content: content.to_string(),
                start: 0,
                end: content.chars().count(),
            },
            score: 0.87,
        }
    }

    #[tokio::test]
    async fn test_prompt_carries_context_and_question() {
        let model = Arc::new(RecordingModel::replying("TCS trades at 31x earnings."));
        let synthesizer = AnswerSynthesizer::new(model.clone());
        let query = Query::new("What is the P/E of TCS?").unwrap();

        let answer = synthesizer
            .synthesize(&query, vec![retrieved("Stock P/E 31.2")])
            .await
            .unwrap();

        assert_eq!(answer.text, "TCS trades at 31x earnings.");
        assert_eq!(answer.sources.len(), 1);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].system.contains("financial assistant"));
        assert!(seen[0].system.ends_with("Stock P/E 31.2"));
        assert_eq!(seen[0].user, "What is the P/E of TCS?");
        assert_eq!(seen[0].max_tokens, 500);
        assert!((seen[0].temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_context_still_calls_model() {
        let model = Arc::new(RecordingModel::replying("From general knowledge: ..."));
        let synthesizer = AnswerSynthesizer::new(model.clone());
        let query = Query::new("Is gold a good hedge?").unwrap();

        let answer = synthesizer.synthesize(&query, Vec::new()).await.unwrap();
        assert_eq!(answer.text, "From general knowledge: ...");
        assert!(answer.sources.is_empty());
        assert_eq!(model.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_synthesis_error() {
        let model = Arc::new(RecordingModel::failing("503 upstream"));
        let synthesizer = AnswerSynthesizer::new(model);
        let query = Query::new("q").unwrap();

        let err = synthesizer.synthesize(&query, Vec::new()).await.unwrap_err();
        assert!(matches!(err, FinragError::Synthesis(_)));
        assert!(err.to_string().contains("503 upstream"));
    }

    #[tokio::test]
    async fn test_blank_answer_is_synthesis_error() {
        let model = Arc::new(RecordingModel::replying("   "));
        let synthesizer = AnswerSynthesizer::new(model);
        let query = Query::new("q").unwrap();

        let err = synthesizer.synthesize(&query, Vec::new()).await.unwrap_err();
        assert!(matches!(err, FinragError::Synthesis(_)));
    }

    #[test]
    fn test_settings_are_applied() {
        let settings = GenerationSettings {
            model: "gpt-4.1".to_string(),
            max_tokens: 64,
            temperature: 0.0,
        };
        let synthesizer = AnswerSynthesizer::new(Arc::new(RecordingModel::replying("x")))
            .with_settings(&settings);
        let request = synthesizer.build_request(&Query::new("q").unwrap(), &[]);
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.temperature, 0.0);
    }

    /// Never answers within any reasonable deadline.
    struct HangingModel;

    #[async_trait]
    impl LanguageModel for HangingModel {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_generation_timeout_is_synthesis_error() {
        let synthesizer =
            AnswerSynthesizer::new(Arc::new(HangingModel)).with_timeout(Duration::from_millis(50));

        let err = synthesizer
            .synthesize(&Query::new("q").unwrap(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FinragError::Synthesis(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_placeholders_in_context_and_question_stay_literal() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(RecordingModel::replying("x")));
        let query = Query::new("{{context}} what is TCS P/E?").unwrap();
        let context = vec![retrieved("Template docs mention {{question}} here.")];

        for _ in 0..50 {
            let request = synthesizer.build_request(&query, &context);
            assert_eq!(request.user, "{{context}} what is TCS P/E?");
            assert!(request.system.ends_with("Template docs mention {{question}} here."));
        }
    }
}
