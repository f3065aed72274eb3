//! # recap-rs
//!
//! Chat assistant with bounded transcript summaries.
//!
//! recap-rs chats through an OpenAI-compatible service and reduces
//! arbitrarily long transcripts to a single summary that fits a token budget.
//! Transcripts are split into token-budgeted chunks with a short overlap,
//! each chunk is summarized, and the summaries are consolidated round after
//! round until one remains.
//!
//! ## Features
//!
//! - **Token counting**: BPE encodings via `tiktoken-rs`, or a character heuristic
//! - **Chunking**: Greedy packing with overlap and natural break points
//! - **Summarization**: Recursive consolidation with bounded rounds
//! - **Chat**: Persona prompts, moderation and persisted chat logs
//! - **Unicode Aware**: Splits never cut inside a character

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chat;
pub mod chunking;
pub mod cli;
pub mod core;
pub mod error;
pub mod io;
pub mod llm;
pub mod summary;
pub mod tokens;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, Exchange, Transcript};

// Re-export chunking types
pub use chunking::{ChunkBudget, OversizePolicy, TokenChunker, find_break, trim_front};

// Re-export token counting
pub use tokens::{TokenCounter, available_encodings, create_counter};

// Re-export service types
pub use llm::{CompletionParams, CompletionProvider, Moderator, OpenAiProvider, RetryConfig};

// Re-export summary types
pub use summary::{SummaryConfig, SummaryEngine, SummaryReport};

// Re-export chat types
pub use chat::{ChatConfig, ChatSession};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
