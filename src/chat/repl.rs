//! Interactive chat loop.
//!
//! Reads questions line by line, gates them through moderation, asks the
//! provider and writes every line of the conversation to the session's chat
//! log. The loop ends on an exit phrase or end of input.

use crate::chat::{ChatSession, is_exit_phrase};
use crate::core::Transcript;
use crate::error::{IoError, Result};
use crate::io::SessionFiles;
use crate::llm::{CompletionProvider, Moderator};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Shown and logged when a question fails moderation.
pub const MODERATION_NOTICE: &str = "Sorry, your question didn't pass the moderation check:";

/// Line roles, for coloring.
#[derive(Debug, Clone, Copy)]
enum Role {
    User,
    Assistant,
    Error,
}

/// Terminal chat front end.
pub struct Repl<'a, W> {
    session: ChatSession,
    provider: &'a dyn CompletionProvider,
    moderator: Option<&'a dyn Moderator>,
    files: &'a SessionFiles,
    output: W,
    color: bool,
}

impl<'a, W: Write> Repl<'a, W> {
    /// Creates a loop writing to `output` and logging to `files`.
    pub fn new(
        session: ChatSession,
        provider: &'a dyn CompletionProvider,
        files: &'a SessionFiles,
        output: W,
    ) -> Self {
        Self {
            session,
            provider,
            moderator: None,
            files,
            output,
            color: true,
        }
    }

    /// Gates questions through `moderator`.
    #[must_use]
    pub fn with_moderator(mut self, moderator: &'a dyn Moderator) -> Self {
        self.moderator = Some(moderator);
        self
    }

    /// Enables or disables ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Runs until an exit phrase or end of input and returns the transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input, writing output or the chat log
    /// fails, or if the provider or moderator fails.
    pub async fn run<R>(mut self, input: R) -> Result<Transcript>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let user_label = format!("{}: ", crate::core::USER_LABEL);

        loop {
            let prompt = self.paint(&user_label, Role::User);
            self.emit(format_args!("{prompt}"))?;
            self.output.flush().map_err(write_error)?;

            let Some(question) = lines.next_line().await? else {
                tracing::debug!("end of input");
                break;
            };
            self.files.log_line(&Transcript::user_line(&question))?;

            if is_exit_phrase(&question) {
                tracing::debug!("exit phrase");
                break;
            }

            if let Some(moderator) = self.moderator {
                let flagged = moderator.check(&question).await?;
                if !flagged.is_empty() {
                    self.reject(&flagged)?;
                    continue;
                }
            }

            let answer = self.session.ask(self.provider, &question).await?;
            let name = format!("{}: ", self.session.config().assistant_name);
            let label = self.paint(&name, Role::Assistant);
            self.emit(format_args!("{label}{answer}\n"))?;
            self.files.log_line(&self.session.transcript().assistant_line(&answer))?;
        }

        Ok(self.session.into_transcript())
    }

    fn reject(&mut self, flagged: &[String]) -> Result<()> {
        let notice = self.paint(MODERATION_NOTICE, Role::Error);
        self.emit(format_args!("{notice}\n"))?;
        self.files.log_line(&Transcript::error_line(MODERATION_NOTICE))?;
        for description in flagged {
            let line = self.paint(description, Role::Error);
            self.emit(format_args!("{line}\n"))?;
            self.files.log_line(&Transcript::error_line(description))?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, role: Role) -> String {
        if !self.color {
            return text.to_string();
        }
        match role {
            Role::User => text.green().bold().to_string(),
            Role::Assistant => text.cyan().bold().to_string(),
            Role::Error => text.red().bold().to_string(),
        }
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) -> Result<()> {
        self.output.write_fmt(args).map_err(write_error)?;
        Ok(())
    }
}

fn write_error(err: std::io::Error) -> crate::Error {
    IoError::WriteFailed {
        path: "<output>".to_string(),
        reason: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;
    use crate::llm::CompletionParams;
    use async_trait::async_trait;
    use chrono::Local;
    use tempfile::TempDir;

    struct Canned;

    #[async_trait]
    impl CompletionProvider for Canned {
        async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String> {
            let turns = prompt.matches("\nHuman: ").count();
            Ok(format!(" answer {turns}"))
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    struct Scripted;

    #[async_trait]
    impl CompletionProvider for Scripted {
        async fn complete(&self, _prompt: &str, _params: &CompletionParams) -> Result<String> {
            Ok("Try this:\nYou: hello\nMe: hi\nEmmy: and I reply".to_string())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct BlockAll;

    #[async_trait]
    impl Moderator for BlockAll {
        async fn check(&self, text: &str) -> Result<Vec<String>> {
            if text.contains("bad") {
                Ok(vec!["Content that is bad.".to_string()])
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn session() -> ChatSession {
        ChatSession::new(ChatConfig::default())
    }

    #[tokio::test]
    async fn test_conversation_until_exit() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path(), &Local::now());
        let mut output = Vec::new();

        let input: &[u8] = b"hello\nhow are you\nbye\nnever read\n";
        let transcript = Repl::new(session(), &Canned, &files, &mut output)
            .with_color(false)
            .run(input)
            .await
            .unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.exchanges[1].answer, "answer 2");

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Emmy: answer 1\n"));
        assert!(!shown.contains("never read"));

        let log = std::fs::read_to_string(files.chat_log()).unwrap();
        assert_eq!(
            log,
            "You: hello\nEmmy: answer 1\nYou: how are you\nEmmy: answer 2\nYou: bye\n"
        );
        assert_eq!(Transcript::parse(&log, "Emmy").exchanges, transcript.exchanges);
    }

    #[tokio::test]
    async fn test_moderated_questions_are_logged_and_skipped() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path(), &Local::now());
        let mut output = Vec::new();

        let input: &[u8] = b"something bad\nsomething good\n";
        let transcript = Repl::new(session(), &Canned, &files, &mut output)
            .with_moderator(&BlockAll)
            .with_color(false)
            .run(input)
            .await
            .unwrap();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.exchanges[0].question, "something good");

        let log = std::fs::read_to_string(files.chat_log()).unwrap();
        assert!(log.contains(&format!("ERROR: {MODERATION_NOTICE}\nERROR: Content that is bad.\n")));
        assert_eq!(Transcript::parse(&log, "Emmy").len(), 1);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains(MODERATION_NOTICE));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path(), &Local::now());
        let input: &[u8] = b"";
        let transcript = Repl::new(session(), &Canned, &files, Vec::new())
            .with_color(false)
            .run(input)
            .await
            .unwrap();
        assert!(transcript.is_empty());
        assert!(!files.chat_log().exists());
    }

    #[tokio::test]
    async fn test_multiline_answer_reads_back_from_log() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path(), &Local::now());

        let input: &[u8] = b"how do I greet?\nthanks\nbye\n";
        let transcript = Repl::new(session(), &Scripted, &files, Vec::new())
            .with_color(false)
            .run(input)
            .await
            .unwrap();
        assert_eq!(transcript.len(), 2);

        let log = std::fs::read_to_string(files.chat_log()).unwrap();
        assert!(log.contains("Emmy: Try this:\n  You: hello\n  Me: hi\n"));
        let parsed = Transcript::parse(&log, "Emmy");
        assert_eq!(parsed.exchanges, transcript.exchanges);
        assert_eq!(
            parsed.exchanges[0].answer,
            "Try this:\nYou: hello\nMe: hi\nEmmy: and I reply"
        );
    }
}
