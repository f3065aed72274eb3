//! Transcript summarization.
//!
//! [`SummaryEngine`] turns an arbitrarily long entry sequence into a single
//! summary within a token budget, using a [`crate::llm::CompletionProvider`]
//! for every chunk.

pub mod config;
pub mod engine;
pub mod prompt;

pub use config::{DEFAULT_MAX_CONSOLIDATED_TOKENS, DEFAULT_MAX_ROUNDS, SummaryConfig};
pub use engine::{SummaryEngine, SummaryReport};
pub use prompt::{CONSOLIDATE_INSTRUCTIONS, PERSONA_INSTRUCTIONS, PromptSet, SUMMARY_INSTRUCTIONS};
