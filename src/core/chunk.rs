//! Chunk representation.
//!
//! A chunk is one request's worth of text for the generative service: an
//! optional overlap fragment carried over from the previous chunk followed by
//! whole entries, joined with newlines.

use crate::io::find_char_boundary;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Separator placed between the parts of a chunk.
pub const SEPARATOR: &str = "\n";

/// A token-budgeted slice of an entry sequence.
///
/// # Examples
///
/// ```
/// use recap_rs::core::Chunk;
///
/// let parts = ["tail of entry 1", "entry 2", "entry 3"];
/// let chunk = Chunk::new(1, &parts, 1, 2..4, 4, 12);
/// assert_eq!(chunk.overlap(), "tail of entry 1");
/// assert_eq!(chunk.body(), "entry 2\nentry 3");
/// assert_eq!(chunk.entry_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequential index (0-based).
    pub index: usize,

    /// Joined text: overlap (if any) and entries, newline-separated.
    pub content: String,

    /// Entries consumed by this chunk, as indices into the chunked sequence.
    pub entry_range: Range<usize>,

    /// Byte length of the leading overlap fragment within `content`.
    pub overlap_len: usize,

    /// Tokens in the overlap fragment.
    pub overlap_tokens: usize,

    /// Tokens in the whole chunk, separators included.
    pub token_count: usize,
}

impl Chunk {
    /// Builds a chunk from its parts.
    ///
    /// When `overlap_parts` is 1 the first element of `parts` is the overlap
    /// fragment; when 0 every element is an entry.
    #[must_use]
    pub fn new(
        index: usize,
        parts: &[&str],
        overlap_parts: usize,
        entry_range: Range<usize>,
        overlap_tokens: usize,
        token_count: usize,
    ) -> Self {
        let overlap_len = if overlap_parts > 0 {
            parts.first().map_or(0, |p| p.len())
        } else {
            0
        };
        Self {
            index,
            content: parts.join(SEPARATOR),
            entry_range,
            overlap_len,
            overlap_tokens,
            token_count,
        }
    }

    /// Returns the overlap fragment carried from the previous chunk.
    #[must_use]
    pub fn overlap(&self) -> &str {
        &self.content[..self.overlap_len]
    }

    /// Returns the content that is new in this chunk.
    #[must_use]
    pub fn body(&self) -> &str {
        if self.overlap_len == 0 {
            &self.content
        } else {
            &self.content[self.overlap_len + SEPARATOR.len()..]
        }
    }

    /// Whether this chunk starts with an overlap fragment.
    #[must_use]
    pub const fn has_overlap(&self) -> bool {
        self.overlap_len > 0
    }

    /// Number of entries in the chunk.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entry_range.end - self.entry_range.start
    }

    /// Size of the content in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Returns a preview of the content (at most `max_len` bytes).
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let end = find_char_boundary(&self.content, max_len);
            &self.content[..end]
        }
    }
}
