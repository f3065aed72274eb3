//! Error types for recap operations.
//!
//! This module provides the error hierarchy using `thiserror` for tokenizing,
//! chunking, calls to the generative service, summary consolidation, file I/O
//! and CLI commands.

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Result type alias for recap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Tokenizer errors (encoding tables, token counting).
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// Chunking-related errors.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Errors reported by the generative service.
    #[error("service error: {0}")]
    Llm(#[from] LlmError),

    /// Summary consolidation errors.
    #[error("summary error: {0}")]
    Summary(#[from] SummaryError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Tokenizer errors.
///
/// Any of these aborts a summarization run: there is no safe degraded token
/// count to substitute.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// The BPE tables could not be loaded or the text could not be encoded.
    #[error("encoding {encoding} failed: {reason}")]
    Encoding {
        /// Encoding name (e.g. "gpt2").
        encoding: String,
        /// Reason for failure.
        reason: String,
    },

    /// Unknown encoding name.
    #[error("unknown encoding: {name}")]
    UnknownEncoding {
        /// Name that was not recognized.
        name: String,
    },
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap budget is not below the input budget.
    #[error("overlap budget {overlap} must be less than input budget {size}")]
    OverlapTooLarge {
        /// Overlap budget in tokens.
        overlap: usize,
        /// Input budget in tokens.
        size: usize,
    },

    /// Entries and token counts differ in length.
    #[error("{entries} entries but {counts} token counts")]
    CountMismatch {
        /// Number of entries.
        entries: usize,
        /// Number of token counts.
        counts: usize,
    },

    /// A single entry cannot fit in a chunk on its own.
    #[error("entry {index} has {tokens} tokens, which does not fit the input budget of {max}")]
    EntryTooLarge {
        /// Index of the entry.
        index: usize,
        /// Token count of the entry.
        tokens: usize,
        /// Input budget in tokens.
        max: usize,
    },
}

/// Errors from the generative service.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network, authentication or rate-limit failure.
    #[error("{message}")]
    Service {
        /// Description of the failure.
        message: String,
        /// Whether retrying may succeed.
        transient: bool,
    },

    /// Prompt exceeds the service context window.
    #[error("prompt exceeds the context window: {message}")]
    ContentLength {
        /// Description returned by the service.
        message: String,
    },

    /// The service returned no text.
    #[error("empty response from {model}")]
    EmptyResponse {
        /// Model that was queried.
        model: String,
    },
}

impl LlmError {
    /// Whether the error is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Service { transient: true, .. })
    }
}

/// Summary consolidation errors.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Nothing to summarize.
    #[error("transcript is empty")]
    EmptyTranscript,

    /// Consolidation did not converge within the round limit.
    #[error("summary did not converge after {rounds} consolidation rounds")]
    RoundLimit {
        /// Rounds performed.
        rounds: usize,
    },

    /// A consolidation round reduced neither entry count nor token total.
    #[error("consolidation round {round} made no progress ({entries} entries, {tokens} tokens)")]
    NoProgress {
        /// Round number (1-based).
        round: usize,
        /// Entries after the round.
        entries: usize,
        /// Total tokens after the round.
        tokens: usize,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Output could not be serialized.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

/// Error code of requests over the model's context window.
const CONTEXT_LENGTH_EXCEEDED: &str = "context_length_exceeded";

impl From<OpenAIError> for LlmError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => {
                if api.code.as_deref() == Some(CONTEXT_LENGTH_EXCEEDED) {
                    return Self::ContentLength {
                        message: api.message,
                    };
                }
                let detail = format!("{api:?}");
                Self::Service {
                    transient: is_transient_api_error(&detail),
                    message: api.message,
                }
            }
            OpenAIError::Reqwest(e) => Self::Service {
                message: format!("request failed: {e}"),
                transient: true,
            },
            other => Self::Service {
                message: other.to_string(),
                transient: false,
            },
        }
    }
}

impl From<OpenAIError> for Error {
    fn from(err: OpenAIError) -> Self {
        Self::Llm(err.into())
    }
}

fn is_transient_api_error(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    ["rate_limit", "server_error", "overloaded", "timeout", "timed out"]
        .iter()
        .any(|p| lower.contains(p))
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::OutputFormat(err.to_string())
    }
}
