//! Question/answer exchanges.

use serde::{Deserialize, Serialize};

/// One question from the user and the assistant's answer.
///
/// # Examples
///
/// ```
/// use recap_rs::core::Exchange;
///
/// let exchange = Exchange::new("How are you?", "Doing well.");
/// assert_eq!(exchange.to_entry("Emmy"), "You: How are you?\nEmmy: Doing well.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// What the user asked.
    pub question: String,
    /// What the assistant answered.
    pub answer: String,
}

impl Exchange {
    /// Creates an exchange.
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Formats the exchange as a labeled transcript entry.
    #[must_use]
    pub fn to_entry(&self, assistant_name: &str) -> String {
        format!(
            "{}: {}\n{assistant_name}: {}",
            super::USER_LABEL,
            self.question.trim(),
            self.answer.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_trims_whitespace() {
        let exchange = Exchange::new("  hi ", "\n\nhello there\n");
        assert_eq!(exchange.to_entry("Emmy"), "You: hi\nEmmy: hello there");
    }

    #[test]
    fn test_entry_keeps_inner_newlines() {
        let exchange = Exchange::new("list?", "- one\n- two");
        assert_eq!(exchange.to_entry("Bot"), "You: list?\nBot: - one\n- two");
    }
}
