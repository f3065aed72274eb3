//! Hard splitting of entries too large for any chunk.
//!
//! An entry is cut into consecutive pieces at the coarsest Unicode boundary
//! that yields pieces within the target: sentences first, then words, then
//! grapheme clusters. Concatenating the pieces reproduces the entry exactly.

use crate::error::{ChunkingError, Result};
use crate::tokens::TokenCounter;
use unicode_segmentation::UnicodeSegmentation;

/// Segmentation granularity, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Sentence,
    Word,
    Grapheme,
}

impl Level {
    fn segments(self, text: &str) -> Vec<&str> {
        match self {
            Self::Sentence => text.split_sentence_bounds().collect(),
            Self::Word => text.split_word_bounds().collect(),
            Self::Grapheme => text.graphemes(true).collect(),
        }
    }

    const fn finer(self) -> Option<Self> {
        match self {
            Self::Sentence => Some(Self::Word),
            Self::Word => Some(Self::Grapheme),
            Self::Grapheme => None,
        }
    }
}

/// Splits `text` into pieces of at most `target` tokens each.
///
/// `index` identifies the entry in error reports.
///
/// # Errors
///
/// Returns [`ChunkingError::EntryTooLarge`] if a single grapheme cluster
/// exceeds `target`, and propagates tokenizer errors.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::split_to_fit;
/// use recap_rs::tokens::HeuristicTokenCounter;
///
/// let counter = HeuristicTokenCounter::new();
/// let text = "First sentence here. Second sentence here. Third one.";
/// let pieces = split_to_fit(&counter, text, 6, 0).unwrap();
/// assert!(pieces.len() > 1);
/// assert_eq!(pieces.concat(), text);
/// ```
pub fn split_to_fit(
    counter: &dyn TokenCounter,
    text: &str,
    target: usize,
    index: usize,
) -> Result<Vec<String>> {
    let mut pieces = Vec::new();
    pack(counter, text, target, index, Level::Sentence, &mut pieces)?;
    tracing::debug!(
        entry = index,
        pieces = pieces.len(),
        target,
        "split oversized entry"
    );
    Ok(pieces)
}

fn pack(
    counter: &dyn TokenCounter,
    text: &str,
    target: usize,
    index: usize,
    level: Level,
    out: &mut Vec<String>,
) -> Result<()> {
    let mut current = String::new();

    for segment in level.segments(text) {
        let mut candidate = current.clone();
        candidate.push_str(segment);
        if counter.count(&candidate)? <= target {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        let tokens = counter.count(segment)?;
        if tokens <= target {
            current.push_str(segment);
        } else if let Some(finer) = level.finer() {
            pack(counter, segment, target, index, finer, out)?;
        } else {
            return Err(ChunkingError::EntryTooLarge {
                index,
                tokens,
                max: target,
            }
            .into());
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    Ok(())
}
