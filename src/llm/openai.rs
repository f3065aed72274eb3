//! OpenAI chat-completions provider.

use crate::error::{LlmError, Result};
use crate::llm::{CompletionParams, CompletionProvider};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the OpenAI API (or a compatible endpoint).
#[derive(Clone, Default)]
pub struct ServiceConfig {
    /// API key. Falls back to `OPENAI_API_KEY` in the environment when unset.
    pub api_key: Option<String>,
    /// Alternative API base URL.
    pub base_url: Option<String>,
    /// Model name.
    pub model: String,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ServiceConfig {
    /// Settings for `model` with credentials from the environment.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: model.into(),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds an `async-openai` client from these settings.
    ///
    /// The client's own rate-limit backoff is disabled; retries are left to
    /// [`crate::llm::RetryingProvider`] and its [`crate::llm::RetryConfig`].
    #[must_use]
    pub fn client(&self) -> Client<OpenAIConfig> {
        let mut config = OpenAIConfig::new();
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(url) = &self.base_url {
            config = config.with_api_base(url);
        }
        Client::with_config(config).with_backoff(single_attempt())
    }
}

/// Backoff that gives up as soon as the first attempt fails.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Masks an API key for logging: first 7 and last 4 characters only.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

/// Completion provider backed by the OpenAI chat-completions endpoint.
///
/// The prompt is sent as a single user message.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a provider from connection settings.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        tracing::debug!(config = ?config, "creating OpenAI provider");
        Self::with_client(config.client(), config.model.clone())
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(LlmError::from)?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(params.temperature)
            .max_completion_tokens(params.max_output_tokens)
            .top_p(params.top_p)
            .frequency_penalty(params.frequency_penalty)
            .presence_penalty(params.presence_penalty)
            .build()
            .map_err(LlmError::from)?;

        tracing::debug!(
            model = %self.model,
            prompt_bytes = prompt.len(),
            "chat completion request"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(LlmError::from)?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat completion usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::EmptyResponse {
                    model: self.model.clone(),
                }
                .into()
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
