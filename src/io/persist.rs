//! Session file layout.
//!
//! Under the output directory:
//!
//! ```text
//! <out_dir>/chats/chat-2024-03-05-14-07-09-123456.txt           chat log
//! <out_dir>/chats/chat-2024-03-05-14-07-09-123456-summary.txt   session summary
//! <out_dir>/summaries.log                                       append-only summary log
//! ```
//!
//! A chat log living elsewhere gets its summary file next to it; the summary
//! log always lives under the output directory.

use crate::error::Result;
use crate::io::{append_file, write_file};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory for chat logs, relative to the output directory.
pub const CHATS_DIR: &str = "chats";

/// Append-only summary log file name.
pub const SUMMARY_LOG_NAME: &str = "summaries.log";

/// Builds the chat log file name for a session started at `started`.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use recap_rs::io::chat_log_name;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(chat_log_name(&at), "chat-2024-03-05-14-07-09-000000.txt");
/// ```
#[must_use]
pub fn chat_log_name(started: &DateTime<Local>) -> String {
    format!("chat-{}.txt", started.format("%Y-%m-%d-%H-%M-%S-%6f"))
}

/// Paths written for one chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFiles {
    out_dir: PathBuf,
    chat_log: PathBuf,
}

/// Where a summary was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedSummary {
    /// Per-session summary file.
    pub summary_file: PathBuf,
    /// Append-only summary log.
    pub summary_log: PathBuf,
}

impl SessionFiles {
    /// Layout for a new session started at `started`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>, started: &DateTime<Local>) -> Self {
        let out_dir = out_dir.into();
        let chat_log = out_dir.join(CHATS_DIR).join(chat_log_name(started));
        Self { out_dir, chat_log }
    }

    /// Layout for an existing chat log.
    #[must_use]
    pub fn for_log(out_dir: impl Into<PathBuf>, chat_log: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            chat_log: chat_log.into(),
        }
    }

    /// Chat log path.
    #[must_use]
    pub fn chat_log(&self) -> &Path {
        &self.chat_log
    }

    /// Per-session summary file path.
    #[must_use]
    pub fn summary_file(&self) -> PathBuf {
        let stem = self
            .chat_log
            .file_stem()
            .map_or_else(|| "chat".to_string(), |s| s.to_string_lossy().to_string());
        self.chat_log.with_file_name(format!("{stem}-summary.txt"))
    }

    /// Summary log path.
    #[must_use]
    pub fn summary_log(&self) -> PathBuf {
        self.out_dir.join(SUMMARY_LOG_NAME)
    }

    /// Appends a line to the chat log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn log_line(&self, line: &str) -> Result<()> {
        append_file(&self.chat_log, &format!("{line}\n"))
    }

    /// Writes the session summary file and appends to the summary log.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn save_summary(&self, summary: &str, at: &DateTime<Local>) -> Result<SavedSummary> {
        let summary_file = self.summary_file();
        let summary_log = self.summary_log();

        write_file(&summary_file, &format!("{}\n", summary.trim()))?;

        let name = self
            .chat_log
            .file_name()
            .map_or_else(String::new, |s| s.to_string_lossy().to_string());
        let record = format!("=== {} {name} ===\n{}\n\n", at.to_rfc3339(), summary.trim());
        append_file(&summary_log, &record)?;

        tracing::info!(
            summary_file = %summary_file.display(),
            summary_log = %summary_log.display(),
            "saved summary"
        );

        Ok(SavedSummary {
            summary_file,
            summary_log,
        })
    }
}
