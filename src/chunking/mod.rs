//! Token-budgeted chunking of entry sequences.
//!
//! Entries (exchanges, or summaries in later rounds) are packed greedily into
//! chunks that stay strictly below the input budget. Consecutive chunks share
//! an overlap: the previous chunk's last entry, trimmed from the front at
//! [`find_break`] points until it fits the overlap budget.
//!
//! - [`breakpoint`]: break-point search and front trimming
//! - [`split`]: hard splitting of single entries that exceed the budget
//! - [`token`]: the greedy chunker

pub mod breakpoint;
pub mod split;
pub mod token;

pub use crate::core::Chunk;
pub use breakpoint::{find_break, trim_front};
pub use split::split_to_fit;
pub use token::TokenChunker;

use crate::error::{ChunkingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default input budget per request: a 4000-token context minus 500 tokens
/// reserved for the completion.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 4000 - 500;

/// Default overlap budget between consecutive chunks.
pub const DEFAULT_MAX_OVERLAP_TOKENS: usize = 200;

/// What to do with an entry that cannot fit a chunk even on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Split the entry at sentence, word, then grapheme boundaries.
    #[default]
    Split,
    /// Fail with [`ChunkingError::EntryTooLarge`].
    Reject,
}

impl FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "split" => Ok(Self::Split),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown oversize policy '{other}' (expected split or reject)"
            )),
        }
    }
}

impl fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split => f.write_str("split"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Token budgets for one chunking pass.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::ChunkBudget;
///
/// let budget = ChunkBudget::new().with_max_input(250).with_max_overlap(50);
/// assert!(budget.validate().is_ok());
/// assert!(ChunkBudget::new().with_max_overlap(5000).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkBudget {
    /// Every chunk's token count stays strictly below this.
    pub max_input_tokens: usize,
    /// Overlap fragments are trimmed to at most this many tokens.
    pub max_overlap_tokens: usize,
    /// Handling of entries too large for a chunk.
    pub oversize: OversizePolicy,
}

impl Default for ChunkBudget {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkBudget {
    /// Default budgets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            max_overlap_tokens: DEFAULT_MAX_OVERLAP_TOKENS,
            oversize: OversizePolicy::Split,
        }
    }

    /// Sets the input budget.
    #[must_use]
    pub const fn with_max_input(mut self, tokens: usize) -> Self {
        self.max_input_tokens = tokens;
        self
    }

    /// Sets the overlap budget.
    #[must_use]
    pub const fn with_max_overlap(mut self, tokens: usize) -> Self {
        self.max_overlap_tokens = tokens;
        self
    }

    /// Sets the oversize policy.
    #[must_use]
    pub const fn with_oversize(mut self, policy: OversizePolicy) -> Self {
        self.oversize = policy;
        self
    }

    /// Checks that the budgets leave room for content.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfig`] for a zero input budget and
    /// [`ChunkingError::OverlapTooLarge`] when the overlap budget is not below
    /// the input budget.
    pub fn validate(&self) -> Result<()> {
        if self.max_input_tokens == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "max_input_tokens must be > 0".to_string(),
            }
            .into());
        }
        if self.max_overlap_tokens >= self.max_input_tokens {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.max_overlap_tokens,
                size: self.max_input_tokens,
            }
            .into());
        }
        Ok(())
    }

    /// Largest piece size, in tokens, that oversized entries are split into.
    ///
    /// Leaves room for a full overlap and its separator when the budget
    /// allows it, otherwise only requires the piece to fit alone.
    #[must_use]
    pub const fn split_target(&self, separator_tokens: usize) -> usize {
        let roomy = self
            .max_input_tokens
            .saturating_sub(self.max_overlap_tokens.saturating_add(separator_tokens + 1));
        if roomy > 0 {
            roomy
        } else {
            self.max_input_tokens.saturating_sub(1)
        }
    }
}
