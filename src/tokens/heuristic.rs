//! Character-based token estimate.

use crate::Result;
use crate::tokens::TokenCounter;

/// Default characters per token.
const CHARS_PER_TOKEN: usize = 4;

/// Estimates tokens as characters divided by four, rounded up.
///
/// Deterministic and infallible, but only an approximation of what the
/// service will count. Useful for dry runs without loading BPE tables.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicTokenCounter {
    chars_per_token: usize,
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicTokenCounter {
    /// Creates a counter with four characters per token.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chars_per_token: CHARS_PER_TOKEN,
        }
    }

    /// Creates a counter with a custom ratio (minimum 1).
    #[must_use]
    pub fn with_ratio(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(text.chars().count().div_ceil(self.chars_per_token))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
