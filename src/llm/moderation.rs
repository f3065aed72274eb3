//! Content moderation gate for chat questions.
//!
//! A question flagged by the moderation endpoint is not sent to the model;
//! the chat loop logs one `ERROR:` line per flagged category instead.

use crate::error::{LlmError, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{Category, CreateModerationRequestArgs};
use async_trait::async_trait;
use std::sync::Arc;

/// Checks text against a content policy.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Returns a description of each flagged category, or an empty list when
    /// the text passes.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Service`] if the moderation service fails.
    async fn check(&self, text: &str) -> Result<Vec<String>>;
}

/// Moderation categories the gate reports, with their descriptions.
const CATEGORIES: [(&str, &str); 7] = [
    (
        "hate",
        "Content that expresses, incites, or promotes hate based on race, gender, ethnicity, religion, nationality, sexual orientation, disability status, or caste.",
    ),
    (
        "hate/threatening",
        "Hateful content that also includes violence or serious harm towards the targeted group.",
    ),
    (
        "self-harm",
        "Content that promotes, encourages, or depicts acts of self-harm, such as suicide, cutting, and eating disorders.",
    ),
    (
        "sexual",
        "Content meant to arouse sexual excitement, such as the description of sexual activity, or that promotes sexual services (excluding sex education and wellness).",
    ),
    (
        "sexual/minors",
        "Sexual content that includes an individual who is under 18 years old.",
    ),
    (
        "violence",
        "Content that promotes or glorifies violence or celebrates the suffering or humiliation of others.",
    ),
    (
        "violence/graphic",
        "Violent content that depicts death, violence, or serious physical injury in extreme graphic detail.",
    ),
];

/// Human-readable description of a moderation category.
///
/// # Examples
///
/// ```
/// use recap_rs::llm::category_description;
///
/// assert!(category_description("sexual/minors").unwrap().contains("under 18"));
/// assert!(category_description("spam").is_none());
/// ```
#[must_use]
pub fn category_description(category: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, description)| *description)
}

/// Descriptions of the flagged categories, in a fixed order.
fn flagged_descriptions(categories: &Category) -> Vec<String> {
    let flags = [
        categories.hate,
        categories.hate_threatening,
        categories.self_harm,
        categories.sexual,
        categories.sexual_minors,
        categories.violence,
        categories.violence_graphic,
    ];
    CATEGORIES
        .iter()
        .zip(flags)
        .filter(|(_, flagged)| *flagged)
        .map(|((_, description), _)| (*description).to_string())
        .collect()
}

/// Moderator backed by the OpenAI moderations endpoint.
#[derive(Clone)]
pub struct OpenAiModerator {
    client: Arc<Client<OpenAIConfig>>,
}

impl std::fmt::Debug for OpenAiModerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiModerator").finish_non_exhaustive()
    }
}

impl OpenAiModerator {
    /// Wraps a client.
    #[must_use]
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl Moderator for OpenAiModerator {
    async fn check(&self, text: &str) -> Result<Vec<String>> {
        let request = CreateModerationRequestArgs::default()
            .input(text)
            .build()
            .map_err(LlmError::from)?;
        let response = self
            .client
            .moderations()
            .create(request)
            .await
            .map_err(LlmError::from)?;

        let Some(result) = response.results.first() else {
            return Ok(Vec::new());
        };
        if !result.flagged {
            return Ok(Vec::new());
        }

        let flagged = flagged_descriptions(&result.categories);
        tracing::info!(categories = flagged.len(), "question failed moderation");
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_descriptions() {
        assert_eq!(CATEGORIES.len(), 7);
        assert!(category_description("hate").unwrap().starts_with("Content that expresses"));
        assert!(category_description("violence/graphic").unwrap().contains("graphic detail"));
        assert!(category_description("harassment").is_none());
    }

    #[test]
    fn test_flagged_descriptions_from_categories() {
        let json = serde_json::json!({
            "hate": false,
            "hate/threatening": false,
            "harassment": false,
            "harassment/threatening": false,
            "illicit": false,
            "illicit/violent": false,
            "self-harm": true,
            "self-harm/intent": false,
            "self-harm/instructions": false,
            "sexual": false,
            "sexual/minors": false,
            "violence": true,
            "violence/graphic": false
        });
        let categories: Category = serde_json::from_value(json).unwrap();
        let flagged = flagged_descriptions(&categories);
        assert_eq!(flagged.len(), 2);
        assert!(flagged[0].contains("self-harm"));
        assert!(flagged[1].contains("glorifies violence"));
    }
}
