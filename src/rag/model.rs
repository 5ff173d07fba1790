//! Generative language model abstraction.

use crate::config::GenerationSettings;
use crate::error::{FinragError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instructions, including any grounding context.
    pub system: String,
    /// The user's message.
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for text generation providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Create the language model named by the settings.
pub fn create_language_model(
    settings: &GenerationSettings,
    timeout: Duration,
) -> Result<Arc<dyn LanguageModel>> {
    Ok(Arc::new(OpenAIChatModel::with_timeout(&settings.model, timeout)?))
}

/// OpenAI chat-completions backed model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn with_timeout(model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
        })
    }

}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| FinragError::Synthesis(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.clone())
                .build()
                .map_err(|e| FinragError::Synthesis(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(|e| FinragError::Synthesis(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            FinragError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| FinragError::Synthesis("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}
