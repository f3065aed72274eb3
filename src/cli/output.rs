//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::error::{CommandError, Error, Result};
use crate::core::Chunk;
use crate::io::SavedSummary;
use crate::summary::SummaryReport;
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Chunk plan for a transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Plan<'a> {
    /// Encoding used for counting.
    pub encoding: &'a str,
    /// Entries in the transcript.
    pub entries: usize,
    /// Sum of the entries' token counts.
    pub entry_tokens: usize,
    /// Per-request budget.
    pub max_input_tokens: usize,
    /// Overlap budget.
    pub max_overlap_tokens: usize,
    /// The chunks.
    pub chunks: &'a [Chunk],
}

/// Token count of one file.
#[derive(Debug, Clone, Serialize)]
pub struct TokenReport<'a> {
    /// The file counted.
    pub path: &'a Path,
    /// Encoding used for counting.
    pub encoding: &'a str,
    /// Tokens in the file.
    pub tokens: usize,
    /// Characters in the file.
    pub chars: usize,
    /// Bytes in the file.
    pub bytes: usize,
}

/// Formats a summary run, with the saved locations if any.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_summary(
    report: &SummaryReport,
    saved: Option<&SavedSummary>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_summary_text(report, saved)),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SummaryOutput<'a> {
                #[serde(flatten)]
                report: &'a SummaryReport,
                #[serde(skip_serializing_if = "Option::is_none")]
                saved: Option<&'a SavedSummary>,
            }
            format_json(&SummaryOutput { report, saved })
        }
    }
}

fn format_summary_text(report: &SummaryReport, saved: Option<&SavedSummary>) -> String {
    let mut output = String::new();
    output.push_str("Summary\n");
    output.push_str("=======\n\n");
    let _ = writeln!(output, "{}\n", report.summary.trim());
    let _ = writeln!(output, "  Entries:   {}", report.entries);
    let _ = writeln!(output, "  Chunks:    {}", report.chunks);
    let _ = writeln!(output, "  Rounds:    {}", report.rounds);
    let _ = writeln!(output, "  Requests:  {}", report.requests);
    let _ = writeln!(output, "  Tokens:    {}", report.token_count);
    if let Some(saved) = saved {
        let _ = writeln!(output, "  Saved:     {}", saved.summary_file.display());
        let _ = writeln!(output, "  Log:       {}", saved.summary_log.display());
    }
    output
}

/// Formats the end of a chat session that was not summarized.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_session_end(
    chat_log: &Path,
    exchanges: usize,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => {
            if exchanges == 0 {
                Ok("No exchanges to summarize.\n".to_string())
            } else {
                Ok(format!(
                    "Chat log: {} ({exchanges} exchanges)\n",
                    chat_log.display()
                ))
            }
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "chat_log": chat_log,
            "exchanges": exchanges,
        })),
    }
}

/// Formats a chunk plan.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_plan(
    plan: &Plan<'_>,
    preview_len: usize,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_plan_text(plan, preview_len)),
        OutputFormat::Json => format_json(plan),
    }
}

fn format_plan_text(plan: &Plan<'_>, preview_len: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} entries, {} tokens ({}), budget {} / overlap {}",
        plan.entries, plan.entry_tokens, plan.encoding, plan.max_input_tokens, plan.max_overlap_tokens
    );
    let _ = writeln!(
        output,
        "{:<6} {:<12} {:<8} {:<8} Preview",
        "Chunk", "Entries", "Tokens", "Overlap"
    );
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for chunk in plan.chunks {
        let entries = format!("{}..{}", chunk.entry_range.start, chunk.entry_range.end);
        let preview = chunk.preview(preview_len).replace('\n', " ");
        let ellipsis = if preview.len() < chunk.size() { "..." } else { "" };
        let _ = writeln!(
            output,
            "{:<6} {:<12} {:<8} {:<8} {preview}{ellipsis}",
            chunk.index, entries, chunk.token_count, chunk.overlap_tokens
        );
    }

    let _ = writeln!(output, "\n{} chunks", plan.chunks.len());
    output
}

/// Formats a token count.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_tokens(report: &TokenReport<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "{}", report.path.display());
            let _ = writeln!(output, "  Tokens:    {} ({})", report.tokens, report.encoding);
            let _ = writeln!(output, "  Chars:     {}", report.chars);
            let _ = writeln!(output, "  Bytes:     {}", report.bytes);
            Ok(output)
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats the list of instruction files written.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_written(
    dir: &Path,
    written: &[PathBuf],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All instruction files already exist in {}\n",
                    dir.display()
                ));
            }
            let mut output = String::new();
            for path in written {
                let _ = writeln!(output, "Wrote {}", path.display());
            }
            Ok(output)
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "dir": dir,
            "written": written,
        })),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            let value = serde_json::json!({ "error": error.to_string() });
            format!("{value:#}\n")
        }
    }
}

fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).map_err(CommandError::from)?;
    json.push('\n');
    Ok(json)
}
