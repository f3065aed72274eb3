//! Generative service abstraction.
//!
//! The summary engine and the chat loop talk to a [`CompletionProvider`]:
//! a prompt goes in, generated text comes out. [`OpenAiProvider`] is the
//! production implementation; tests plug in deterministic stubs.
//! [`RetryingProvider`] wraps any provider with bounded exponential backoff
//! for transient failures.

pub mod moderation;
pub mod openai;
pub mod retry;

pub use moderation::{Moderator, OpenAiModerator, category_description};
pub use openai::{DEFAULT_MODEL, OpenAiProvider, ServiceConfig};
pub use retry::{RetryConfig, RetryingProvider};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Penalty on repeated tokens, by frequency.
    pub frequency_penalty: f32,
    /// Penalty on tokens already present.
    pub presence_penalty: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self::summary()
    }
}

impl CompletionParams {
    /// Parameters for summary and consolidation requests.
    #[must_use]
    pub const fn summary() -> Self {
        Self {
            temperature: 0.5,
            max_output_tokens: 500,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }

    /// Parameters for conversational replies.
    #[must_use]
    pub const fn chat() -> Self {
        Self {
            temperature: 0.9,
            max_output_tokens: 500,
            top_p: 1.0,
            frequency_penalty: 0.6,
            presence_penalty: 0.7,
        }
    }

    /// Sets the temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token limit.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

/// A text-generation service.
///
/// Implementations must be usable from concurrent tasks.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LlmError::Service`] for network, auth or
    /// rate-limit failures and [`crate::error::LlmError::ContentLength`] when
    /// the prompt does not fit the model's context window.
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for std::sync::Arc<P> {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        (**self).complete(prompt, params).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
