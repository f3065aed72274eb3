//! Token counting.
//!
//! Token budgets for the generative service are enforced against counts from
//! a [`TokenCounter`]. The BPE-backed [`TiktokenCounter`] matches the
//! service's own accounting; [`HeuristicTokenCounter`] is a deterministic
//! estimate for offline planning.

mod heuristic;
mod tiktoken;

pub use heuristic::HeuristicTokenCounter;
pub use tiktoken::{Encoding, TiktokenCounter};

use crate::Result;
use rayon::prelude::*;

/// Default encoding name (GPT-2 byte-pair encoding).
pub const DEFAULT_ENCODING: &str = "gpt2";

/// Trait for token counters.
///
/// Implementations must be deterministic and thread-safe (`Send + Sync`) so
/// that whole sequences can be counted in parallel.
///
/// # Examples
///
/// ```
/// use recap_rs::tokens::{HeuristicTokenCounter, TokenCounter};
///
/// let counter = HeuristicTokenCounter::new();
/// assert_eq!(counter.count("abcdefgh").unwrap(), 2);
/// ```
pub trait TokenCounter: Send + Sync {
    /// Counts the tokens in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TokenizerError`] if the text cannot be encoded.
    fn count(&self, text: &str) -> Result<usize>;

    /// Returns the encoding name.
    fn name(&self) -> &'static str;

    /// Counts every text in the sequence, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first tokenizer error encountered.
    fn count_all(&self, texts: &[String]) -> Result<Vec<usize>> {
        texts.par_iter().map(|text| self.count(text)).collect()
    }
}

/// Creates a token counter by encoding name.
///
/// `"heuristic"` selects [`HeuristicTokenCounter`]; every other name is
/// resolved through [`Encoding::parse`].
///
/// # Errors
///
/// Returns [`crate::error::TokenizerError::UnknownEncoding`] for unknown names
/// and [`crate::error::TokenizerError::Encoding`] if the BPE tables fail to
/// load.
pub fn create_counter(name: &str) -> Result<Box<dyn TokenCounter>> {
    if name.eq_ignore_ascii_case("heuristic") {
        return Ok(Box::new(HeuristicTokenCounter::new()));
    }
    let encoding = Encoding::parse(name)?;
    Ok(Box::new(TiktokenCounter::new(encoding)?))
}

/// Lists available encoding names.
#[must_use]
pub fn available_encodings() -> Vec<&'static str> {
    vec!["gpt2", "p50k_base", "cl100k_base", "o200k_base", "heuristic"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_counter_heuristic() {
        let counter = create_counter("heuristic").unwrap();
        assert_eq!(counter.name(), "heuristic");
    }

    #[test]
    fn test_create_counter_default() {
        let counter = create_counter(DEFAULT_ENCODING).unwrap();
        assert_eq!(counter.name(), "gpt2");
    }

    #[test]
    fn test_create_counter_unknown() {
        assert!(create_counter("klingon").is_err());
    }

    #[test]
    fn test_count_all_preserves_order() {
        let counter = HeuristicTokenCounter::new();
        let texts = vec![
            "a".repeat(40),
            String::new(),
            "b".repeat(4),
            "c".repeat(9),
        ];
        let counts = counter.count_all(&texts).unwrap();
        assert_eq!(counts, vec![10, 0, 1, 3]);
    }

    #[test]
    fn test_count_all_empty() {
        let counter = HeuristicTokenCounter::new();
        assert!(counter.count_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_available_encodings() {
        let names = available_encodings();
        assert!(names.contains(&"gpt2"));
        assert!(names.contains(&"heuristic"));
        for name in names {
            assert!(create_counter(name).is_ok(), "{name} should load");
        }
    }
}
