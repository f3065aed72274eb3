//! Conversational state for one chat session.
//!
//! Each question is sent with the persona instructions and the most recent
//! exchanges, formatted as a `Human:` / `AI:` dialogue ending in an open
//! `AI:` turn for the model to complete.

use crate::core::{DEFAULT_ASSISTANT_NAME, Exchange, Transcript};
use crate::error::Result;
use crate::llm::{CompletionParams, CompletionProvider};
use crate::summary::PERSONA_INSTRUCTIONS;

/// Marker opening a user turn in the prompt.
pub const QUESTION_SEQUENCE: &str = "\nHuman: ";

/// Marker opening an assistant turn in the prompt.
pub const ANSWER_SEQUENCE: &str = "\nAI:";

/// Previous exchanges included in each prompt.
pub const DEFAULT_MAX_CONTEXT_QUESTIONS: usize = 10;

/// Inputs that end the session (compared case-insensitively).
pub const EXIT_PHRASES: [&str; 11] = [
    "quit",
    "exit",
    "goodbye",
    "farewell",
    "au revoir",
    "stop",
    "stop chat",
    "goodnight",
    "adieu",
    "see you later",
    "talk to you later",
];

/// Whether `input` ends the session: it contains "bye" anywhere, or it is
/// one of [`EXIT_PHRASES`].
///
/// # Examples
///
/// ```
/// use recap_rs::chat::is_exit_phrase;
///
/// assert!(is_exit_phrase("ok bye then"));
/// assert!(is_exit_phrase("See you later"));
/// assert!(!is_exit_phrase("stop the car"));
/// ```
#[must_use]
pub fn is_exit_phrase(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    lower.contains("bye") || EXIT_PHRASES.contains(&lower.as_str())
}

/// Chat settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Persona instructions that open every prompt.
    pub persona: String,
    /// Name the assistant answers under.
    pub assistant_name: String,
    /// Sampling parameters for replies.
    pub params: CompletionParams,
    /// Previous exchanges included in each prompt.
    pub max_context_questions: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            persona: PERSONA_INSTRUCTIONS.to_string(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            params: CompletionParams::chat(),
            max_context_questions: DEFAULT_MAX_CONTEXT_QUESTIONS,
        }
    }
}

/// An ongoing conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    config: ChatConfig,
    transcript: Transcript,
}

impl ChatSession {
    /// Starts an empty session.
    #[must_use]
    pub fn new(config: ChatConfig) -> Self {
        let transcript = Transcript::new(config.assistant_name.clone());
        Self { config, transcript }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the exchanges so far.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the session, returning its transcript.
    #[must_use]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Builds the prompt for `question` from the persona and recent history.
    #[must_use]
    pub fn build_prompt(&self, question: &str) -> String {
        let exchanges = &self.transcript.exchanges;
        let skip = exchanges
            .len()
            .saturating_sub(self.config.max_context_questions);

        let mut prompt = self.config.persona.clone();
        for exchange in &exchanges[skip..] {
            prompt.push_str(QUESTION_SEQUENCE);
            prompt.push_str(&exchange.question);
            prompt.push_str(ANSWER_SEQUENCE);
            prompt.push_str(&exchange.answer);
        }
        prompt.push_str(QUESTION_SEQUENCE);
        prompt.push_str(question);
        prompt.push_str(ANSWER_SEQUENCE);
        prompt
    }

    /// Records a completed exchange.
    pub fn record(&mut self, question: &str, answer: &str) {
        self.transcript.push(Exchange::new(question, answer));
    }

    /// Asks `question`, records the exchange and returns the answer.
    ///
    /// # Errors
    ///
    /// Propagates provider errors; nothing is recorded on failure.
    pub async fn ask(&mut self, provider: &dyn CompletionProvider, question: &str) -> Result<String> {
        let prompt = self.build_prompt(question);
        let answer = provider.complete(&prompt, &self.config.params).await?;
        let answer = answer.trim().to_string();
        tracing::debug!(
            exchanges = self.transcript.len() + 1,
            answer_bytes = answer.len(),
            "chat exchange"
        );
        self.record(question, &answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use test_case::test_case;

    struct Parrot;

    #[async_trait]
    impl CompletionProvider for Parrot {
        async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
            assert!((params.temperature - 0.9).abs() < f32::EPSILON);
            let question = prompt
                .rsplit(QUESTION_SEQUENCE)
                .next()
                .and_then(|turn| turn.strip_suffix(ANSWER_SEQUENCE))
                .unwrap_or_default();
            Ok(format!(" You said {question}.\n"))
        }

        fn model(&self) -> &str {
            "parrot"
        }
    }

    #[test_case("bye" ; "bare bye")]
    #[test_case("Goodbye" ; "capitalized")]
    #[test_case("okay, bye!" ; "embedded bye")]
    #[test_case("quit" ; "quit")]
    #[test_case("  EXIT  " ; "padded upper")]
    #[test_case("au revoir" ; "two words")]
    #[test_case("talk to you later" ; "phrase")]
    fn test_exit_phrases(input: &str) {
        assert!(is_exit_phrase(input));
    }

    #[test_case("hello" ; "greeting")]
    #[test_case("how do I exit vim" ; "contains exit")]
    #[test_case("stop chatting" ; "prefix of stop chat")]
    #[test_case("" ; "empty")]
    fn test_not_exit_phrases(input: &str) {
        assert!(!is_exit_phrase(input));
    }

    #[test]
    fn test_first_prompt() {
        let session = ChatSession::new(ChatConfig::default());
        let prompt = session.build_prompt("Hi there");
        assert!(prompt.starts_with(PERSONA_INSTRUCTIONS));
        assert!(prompt.ends_with("\nHuman: Hi there\nAI:"));
    }

    #[test]
    fn test_prompt_includes_recent_history_only() {
        let config = ChatConfig {
            max_context_questions: 2,
            persona: "P".to_string(),
            ..ChatConfig::default()
        };
        let mut session = ChatSession::new(config);
        session.record("q1", "a1");
        session.record("q2", "a2");
        session.record("q3", "a3");

        let prompt = session.build_prompt("q4");
        assert_eq!(prompt, "P\nHuman: q2\nAI:a2\nHuman: q3\nAI:a3\nHuman: q4\nAI:");
    }

    #[tokio::test]
    async fn test_ask_records_trimmed_answer() {
        let mut session = ChatSession::new(ChatConfig::default());
        let answer = session.ask(&Parrot, "hello").await.unwrap();
        assert_eq!(answer, "You said hello.");
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(
            session.transcript().entries(),
            vec!["You: hello\nEmmy: You said hello.".to_string()]
        );
    }
}
