//! Chat transcripts.
//!
//! A transcript is the ordered list of exchanges of one chat session. The
//! chat log on disk is line-oriented:
//!
//! ```text
//! You: question
//! Emmy: answer, possibly
//!   spanning several lines
//! ERROR: moderation message for a rejected question
//! ```
//!
//! Continuation lines are written with a two-space indent, so an answer
//! line that itself starts with `You:` is not read back as a question.
//! Unindented continuation lines are still accepted.
//!
//! Questions that never received an answer (rejected by moderation, or the
//! closing exit phrase) are not part of the transcript.

use crate::core::Exchange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Label of user lines in the chat log.
pub const USER_LABEL: &str = "You";

/// Label of moderation error lines in the chat log.
pub const ERROR_LABEL: &str = "ERROR";

/// Default assistant name.
pub const DEFAULT_ASSISTANT_NAME: &str = "Emmy";

/// Prefix of continuation lines in the chat log.
const CONTINUATION_INDENT: &str = "  ";

/// Ordered exchanges of one chat session.
///
/// # Examples
///
/// ```
/// use recap_rs::core::Transcript;
///
/// let log = "You: hi\nEmmy: hello\nYou: bye\n";
/// let transcript = Transcript::parse(log, "Emmy");
/// assert_eq!(transcript.len(), 1);
/// assert_eq!(transcript.entries(), vec!["You: hi\nEmmy: hello".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Chat log the transcript was read from, if any.
    pub source: Option<PathBuf>,

    /// Name the assistant answers under.
    pub assistant_name: String,

    /// Exchanges in chronological order.
    pub exchanges: Vec<Exchange>,
}

/// Parser position within the log.
enum Pending {
    None,
    Question(String),
    Answer(String, String),
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            source: None,
            assistant_name: assistant_name.into(),
            exchanges: Vec::new(),
        }
    }

    /// Sets the source path.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Parses a chat log.
    ///
    /// Indented lines continue the question or answer being read, with the
    /// indent removed. Unindented lines that do not start with a known label
    /// continue the answer being read; outside an answer they are ignored.
    #[must_use]
    pub fn parse(log: &str, assistant_name: &str) -> Self {
        let mut transcript = Self::new(assistant_name);
        let mut pending = Pending::None;

        for line in log.lines() {
            if let Some(text) = line.strip_prefix(CONTINUATION_INDENT) {
                match &mut pending {
                    Pending::Question(body) | Pending::Answer(_, body) => {
                        body.push('\n');
                        body.push_str(text);
                    }
                    Pending::None => {}
                }
            } else if let Some(question) = strip_label(line, USER_LABEL) {
                transcript.finish(pending);
                pending = Pending::Question(question.to_string());
            } else if let Some(answer) = strip_label(line, assistant_name) {
                pending = match pending {
                    Pending::Question(question) => Pending::Answer(question, answer.to_string()),
                    other => {
                        transcript.finish(other);
                        Pending::None
                    }
                };
            } else if strip_label(line, ERROR_LABEL).is_some() {
                // the pending question was rejected
                transcript.finish(pending);
                pending = Pending::None;
            } else if let Pending::Answer(_, answer) = &mut pending {
                answer.push('\n');
                answer.push_str(line);
            }
        }
        transcript.finish(pending);
        transcript
    }

    fn finish(&mut self, pending: Pending) {
        if let Pending::Answer(question, answer) = pending {
            self.exchanges.push(Exchange::new(question, answer.trim_end()));
        }
    }

    /// Appends an exchange.
    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    /// Number of exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Whether the transcript has no exchanges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Returns the labeled entries handed to the summary engine.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.exchanges
            .iter()
            .map(|e| e.to_entry(&self.assistant_name))
            .collect()
    }

    /// Formats a user line for the chat log.
    #[must_use]
    pub fn user_line(question: &str) -> String {
        labeled(USER_LABEL, question)
    }

    /// Formats an assistant line for the chat log.
    ///
    /// Every line after the first is indented, so the answer reads back
    /// unchanged whatever its lines start with.
    #[must_use]
    pub fn assistant_line(&self, answer: &str) -> String {
        labeled(&self.assistant_name, answer)
    }

    /// Formats a moderation error line for the chat log.
    #[must_use]
    pub fn error_line(message: &str) -> String {
        labeled(ERROR_LABEL, message)
    }
}

fn labeled(label: &str, text: &str) -> String {
    let mut line = format!("{label}:");
    for (i, part) in text.split('\n').enumerate() {
        if i == 0 {
            line.push(' ');
        } else {
            line.push('\n');
            line.push_str(CONTINUATION_INDENT);
        }
        line.push_str(part);
    }
    line
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_log() {
        let log = "You: What is Rust?\nEmmy: A systems language.\nYou: Thanks\nEmmy: Anytime!\n";
        let transcript = Transcript::parse(log, "Emmy");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.exchanges[0].question, "What is Rust?");
        assert_eq!(transcript.exchanges[1].answer, "Anytime!");
    }

    #[test]
    fn test_parse_multiline_answer() {
        let log = "You: list three\nEmmy: \n\n- one\n- two\n- three\nYou: bye";
        let transcript = Transcript::parse(log, "Emmy");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.exchanges[0].answer, "\n\n- one\n- two\n- three");
        assert_eq!(
            transcript.entries()[0],
            "You: list three\nEmmy: - one\n- two\n- three"
        );
    }

    #[test]
    fn test_parse_skips_rejected_questions() {
        let log = "You: something bad\n\
                   ERROR: Sorry, you're question didn't pass the moderation check: \n\
                   ERROR: Content that expresses hate.\n\
                   You: something fine\n\
                   Emmy: ok";
        let transcript = Transcript::parse(log, "Emmy");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.exchanges[0].question, "something fine");
    }

    #[test]
    fn test_parse_drops_trailing_exit_phrase() {
        let transcript = Transcript::parse("You: hi\nEmmy: hey\nYou: goodbye\n", "Emmy");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_parse_custom_assistant_name() {
        let log = "You: hi\nAda: hello\n";
        assert_eq!(Transcript::parse(log, "Ada").len(), 1);
        assert!(Transcript::parse(log, "Emmy").is_empty());
    }

    #[test]
    fn test_parse_empty_log() {
        assert!(Transcript::parse("", "Emmy").is_empty());
    }

    #[test]
    fn test_log_lines_round_trip() {
        let mut transcript = Transcript::new("Emmy");
        transcript.push(Exchange::new("Q1", "A1"));
        let log = format!(
            "{}\n{}\n",
            Transcript::user_line("Q1"),
            transcript.assistant_line("A1")
        );
        assert_eq!(Transcript::parse(&log, "Emmy").exchanges, transcript.exchanges);
    }

    #[test]
    fn test_answer_with_label_lines_round_trips() {
        let mut transcript = Transcript::new("Emmy");
        transcript.push(Exchange::new("how do I greet?", "Try this:\nYou: hello\nMe: hi"));
        transcript.push(Exchange::new(
            "and a bot?",
            "Write:\n\nEmmy: hello\nERROR: none\n  indented",
        ));
        transcript.push(Exchange::new("thanks", "sure"));

        let mut log = String::new();
        for exchange in &transcript.exchanges {
            log.push_str(&Transcript::user_line(&exchange.question));
            log.push('\n');
            log.push_str(&transcript.assistant_line(&exchange.answer));
            log.push('\n');
        }
        log.push_str(&Transcript::user_line("bye"));

        assert_eq!(Transcript::parse(&log, "Emmy").exchanges, transcript.exchanges);
    }

    #[test]
    fn test_assistant_line_indents_continuations() {
        let transcript = Transcript::new("Emmy");
        assert_eq!(
            transcript.assistant_line("Try this:\nYou: hello\n\nok"),
            "Emmy: Try this:\n  You: hello\n  \n  ok"
        );
        assert_eq!(Transcript::user_line("hi"), "You: hi");
    }

    #[test]
    fn test_parse_indented_question_continuation() {
        let log = "You: first line\n  second line\nEmmy: ok\n";
        let transcript = Transcript::parse(log, "Emmy");
        assert_eq!(transcript.exchanges[0].question, "first line\nsecond line");
    }

    #[test]
    fn test_with_source() {
        let transcript = Transcript::new("Emmy").with_source("/tmp/chat.txt");
        assert_eq!(transcript.source, Some(PathBuf::from("/tmp/chat.txt")));
    }
}
