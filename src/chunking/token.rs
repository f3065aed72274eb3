//! Greedy token-budgeted chunker.

use crate::chunking::{ChunkBudget, OversizePolicy, split_to_fit, trim_front};
use crate::core::Chunk;
use crate::core::chunk::SEPARATOR;
use crate::error::{ChunkingError, Result};
use crate::tokens::TokenCounter;
use std::borrow::Cow;

/// One unit the chunker packs: an entry, or a piece of an oversized entry.
#[derive(Debug)]
struct Piece<'e> {
    text: Cow<'e, str>,
    tokens: usize,
    origin: usize,
}

/// Packs entries into chunks below the input budget.
///
/// Each chunk after the first starts with an overlap fragment: the last
/// entry of the previous chunk, trimmed from the front with [`trim_front`]
/// until it fits the overlap budget. The separator between parts is charged
/// at its own token cost.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::{ChunkBudget, TokenChunker};
/// use recap_rs::tokens::HeuristicTokenCounter;
///
/// let counter = HeuristicTokenCounter::new();
/// let chunker = TokenChunker::new(&counter, ChunkBudget::new()).unwrap();
/// let entries = vec!["You: hi\nEmmy: hello".to_string()];
/// let counts = vec![5];
/// let chunks = chunker.make_chunks(&entries, &counts).unwrap();
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].content, entries[0]);
/// ```
pub struct TokenChunker<'a> {
    counter: &'a dyn TokenCounter,
    budget: ChunkBudget,
    separator_tokens: usize,
}

impl std::fmt::Debug for TokenChunker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenChunker")
            .field("counter", &self.counter.name())
            .field("budget", &self.budget)
            .field("separator_tokens", &self.separator_tokens)
            .finish()
    }
}

impl<'a> TokenChunker<'a> {
    /// Creates a chunker after validating the budget.
    ///
    /// # Errors
    ///
    /// Returns a [`ChunkingError`] for an invalid budget, or a tokenizer
    /// error if the separator cannot be counted.
    pub fn new(counter: &'a dyn TokenCounter, budget: ChunkBudget) -> Result<Self> {
        budget.validate()?;
        let separator_tokens = counter.count(SEPARATOR)?;
        Ok(Self {
            counter,
            budget,
            separator_tokens,
        })
    }

    /// Returns the budget in use.
    #[must_use]
    pub const fn budget(&self) -> &ChunkBudget {
        &self.budget
    }

    /// Splits `entries` into chunks.
    ///
    /// `token_counts[i]` must be the token count of `entries[i]`. Each
    /// chunk's `entry_range` indexes into `entries`; when an oversized entry
    /// was split, neighbouring chunks may share that entry's index.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::CountMismatch`] if the slices differ in
    /// length, [`ChunkingError::EntryTooLarge`] for an entry that cannot fit
    /// under [`OversizePolicy::Reject`] (or cannot be split small enough),
    /// and propagates tokenizer errors.
    pub fn make_chunks(&self, entries: &[String], token_counts: &[usize]) -> Result<Vec<Chunk>> {
        if entries.len() != token_counts.len() {
            return Err(ChunkingError::CountMismatch {
                entries: entries.len(),
                counts: token_counts.len(),
            }
            .into());
        }

        let pieces = self.prepare(entries, token_counts)?;
        let max = self.budget.max_input_tokens;

        let mut chunks = Vec::new();
        let mut i = 0;
        let mut overlap: &str = "";
        let mut overlap_tokens = 0;

        while i < pieces.len() {
            let start = i;
            let mut parts: Vec<&str> = Vec::new();
            let mut running = 0;
            if !overlap.is_empty() {
                parts.push(overlap);
                running = overlap_tokens;
            }

            while i < pieces.len() {
                let join = if parts.is_empty() { 0 } else { self.separator_tokens };
                let next = running + join + pieces[i].tokens;
                if next >= max {
                    break;
                }
                parts.push(&pieces[i].text);
                running = next;
                i += 1;
            }

            if i == start {
                if overlap.is_empty() {
                    return Err(ChunkingError::EntryTooLarge {
                        index: pieces[i].origin,
                        tokens: pieces[i].tokens,
                        max,
                    }
                    .into());
                }
                tracing::debug!(
                    chunk = chunks.len(),
                    overlap_tokens,
                    entry_tokens = pieces[i].tokens,
                    "dropping overlap, entry does not fit after it"
                );
                overlap = "";
                overlap_tokens = 0;
                continue;
            }

            let overlap_parts = usize::from(!overlap.is_empty());
            let entry_range = pieces[start].origin..pieces[i - 1].origin + 1;
            let chunk = Chunk::new(
                chunks.len(),
                &parts,
                overlap_parts,
                entry_range,
                if overlap_parts > 0 { overlap_tokens } else { 0 },
                running,
            );
            tracing::debug!(
                chunk = chunk.index,
                tokens = chunk.token_count,
                entries = chunk.entry_count(),
                overlap_tokens = chunk.overlap_tokens,
                "built chunk"
            );
            chunks.push(chunk);

            if i < pieces.len() {
                (overlap, overlap_tokens) = self.trim_overlap(&pieces[i - 1])?;
            }
        }

        Ok(chunks)
    }

    /// Applies the oversize policy, producing pieces that each fit alone.
    fn prepare<'e>(&self, entries: &'e [String], token_counts: &[usize]) -> Result<Vec<Piece<'e>>> {
        let max = self.budget.max_input_tokens;
        let mut pieces = Vec::with_capacity(entries.len());

        for (origin, (entry, &tokens)) in entries.iter().zip(token_counts).enumerate() {
            if tokens < max {
                pieces.push(Piece {
                    text: Cow::Borrowed(entry.as_str()),
                    tokens,
                    origin,
                });
                continue;
            }

            match self.budget.oversize {
                OversizePolicy::Reject => {
                    return Err(ChunkingError::EntryTooLarge {
                        index: origin,
                        tokens,
                        max,
                    }
                    .into());
                }
                OversizePolicy::Split => {
                    let target = self.budget.split_target(self.separator_tokens);
                    tracing::warn!(entry = origin, tokens, max, "entry exceeds input budget, splitting");
                    for text in split_to_fit(self.counter, entry, target, origin)? {
                        let tokens = self.counter.count(&text)?;
                        pieces.push(Piece {
                            text: Cow::Owned(text),
                            tokens,
                            origin,
                        });
                    }
                }
            }
        }

        Ok(pieces)
    }

    /// Trims a piece from the front until it fits the overlap budget.
    fn trim_overlap<'p>(&self, piece: &'p Piece<'_>) -> Result<(&'p str, usize)> {
        let mut text: &str = &piece.text;
        let mut tokens = piece.tokens;
        while tokens > self.budget.max_overlap_tokens && !text.is_empty() {
            text = trim_front(text);
            tokens = self.counter.count(text)?;
        }
        if text.is_empty() {
            tokens = 0;
        }
        Ok((text, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::HeuristicTokenCounter;
    use proptest::prelude::*;

    /// Counts one token per whitespace-separated word; newline costs nothing.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }

        fn name(&self) -> &'static str {
            "words"
        }
    }

    fn words(n: usize, tag: &str) -> String {
        (0..n).map(|i| format!("{tag}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_hundred_token_entries_at_250() {
        let counter = WordCounter;
        let budget = ChunkBudget::new().with_max_input(250).with_max_overlap(200);
        let chunker = TokenChunker::new(&counter, budget).unwrap();

        let entries = vec![words(100, "a"), words(100, "b"), words(100, "c")];
        let counts = counter.count_all(&entries).unwrap();
        let chunks = chunker.make_chunks(&entries, &counts).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].entry_range, 0..2);
        assert_eq!(chunks[0].token_count, 200);
        assert!(!chunks[0].has_overlap());

        assert_eq!(chunks[1].entry_range, 2..3);
        assert!(chunks[1].has_overlap());
        assert!(entries[1].ends_with(chunks[1].overlap()));
        assert_eq!(chunks[1].body(), entries[2]);
        assert!(chunks[1].token_count < 250);
    }

    #[test]
    fn test_overlap_trimmed_to_budget() {
        let counter = WordCounter;
        let budget = ChunkBudget::new().with_max_input(250).with_max_overlap(30);
        let chunker = TokenChunker::new(&counter, budget).unwrap();

        let entries = vec![words(100, "a"), words(100, "b"), words(100, "c")];
        let counts = counter.count_all(&entries).unwrap();
        let chunks = chunker.make_chunks(&entries, &counts).unwrap();

        assert_eq!(chunks[1].overlap_tokens, counter.count(chunks[1].overlap()).unwrap());
        assert!(chunks[1].overlap_tokens <= 30);
        assert!(chunks[1].overlap_tokens > 0);
    }

    #[test]
    fn test_all_entries_in_one_chunk() {
        let counter = WordCounter;
        let chunker = TokenChunker::new(&counter, ChunkBudget::new()).unwrap();
        let entries = vec!["one two".to_string(), "three".to_string()];
        let chunks = chunker.make_chunks(&entries, &[2, 1]).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "one two\nthree");
        assert_eq!(chunks[0].token_count, 3);
    }

    #[test]
    fn test_empty_input() {
        let counter = WordCounter;
        let chunker = TokenChunker::new(&counter, ChunkBudget::new()).unwrap();
        assert!(chunker.make_chunks(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_count_mismatch() {
        let counter = WordCounter;
        let chunker = TokenChunker::new(&counter, ChunkBudget::new()).unwrap();
        let result = chunker.make_chunks(&["a".to_string()], &[]);
        assert!(matches!(
            result,
            Err(crate::Error::Chunking(ChunkingError::CountMismatch {
                entries: 1,
                counts: 0
            }))
        ));
    }

    #[test]
    fn test_invalid_budget() {
        let counter = WordCounter;
        let budget = ChunkBudget::new().with_max_input(10).with_max_overlap(10);
        assert!(TokenChunker::new(&counter, budget).is_err());
    }

    #[test]
    fn test_overlap_dropped_when_entry_does_not_fit_after_it() {
        let counter = WordCounter;
        let budget = ChunkBudget::new().with_max_input(100).with_max_overlap(50);
        let chunker = TokenChunker::new(&counter, budget).unwrap();

        let entries = vec![words(60, "a"), words(90, "b")];
        let counts = counter.count_all(&entries).unwrap();
        let chunks = chunker.make_chunks(&entries, &counts).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(!chunks[1].has_overlap());
        assert_eq!(chunks[1].content, entries[1]);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let counter = WordCounter;
        let budget = ChunkBudget::new()
            .with_max_input(50)
            .with_max_overlap(10)
            .with_oversize(OversizePolicy::Reject);
        let chunker = TokenChunker::new(&counter, budget).unwrap();

        let entries = vec![words(5, "a"), words(80, "b")];
        let counts = counter.count_all(&entries).unwrap();
        let result = chunker.make_chunks(&entries, &counts);
        assert!(matches!(
            result,
            Err(crate::Error::Chunking(ChunkingError::EntryTooLarge {
                index: 1,
                tokens: 80,
                max: 50
            }))
        ));
    }

    #[test]
    fn test_oversized_entry_split() {
        let counter = WordCounter;
        let budget = ChunkBudget::new().with_max_input(50).with_max_overlap(10);
        let chunker = TokenChunker::new(&counter, budget).unwrap();

        let entries = vec![words(5, "a"), words(120, "b"), words(5, "c")];
        let counts = counter.count_all(&entries).unwrap();
        let chunks = chunker.make_chunks(&entries, &counts).unwrap();

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.token_count < 50);
            assert_eq!(chunk.token_count, counter.count(&chunk.content).unwrap());
        }
        let bodies: String = chunks.iter().map(Chunk::body).collect::<Vec<_>>().join("\n");
        assert!(bodies.starts_with("a0 a1"));
        assert!(bodies.ends_with("c3 c4"));
        assert!(bodies.contains("b119"));
    }

    #[test]
    fn test_separator_cost_is_charged() {
        let counter = HeuristicTokenCounter::new();
        // "\n" costs 1 token, each entry 2
        let budget = ChunkBudget::new().with_max_input(8).with_max_overlap(0);
        let chunker = TokenChunker::new(&counter, budget).unwrap();
        let entries = vec!["abcdefgh".to_string(); 3];
        let chunks = chunker.make_chunks(&entries, &[2, 2, 2]).unwrap();

        // 2 + 1 + 2 = 5, adding another would reach 8
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].token_count, 5);
        assert_eq!(chunks[0].entry_range, 0..2);
        assert!(!chunks[1].has_overlap());
    }

    fn entry_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,40}(\\. [a-z]{1,8}){0,3}", 1..20)
    }

    proptest! {
        #[test]
        fn prop_chunks_within_budget(
            entries in entry_strategy(),
            max_input in 5usize..80,
            overlap_share in 0usize..100,
        ) {
            let counter = WordCounter;
            let max_overlap = max_input * overlap_share / 100;
            let budget = ChunkBudget::new()
                .with_max_input(max_input)
                .with_max_overlap(max_overlap.min(max_input - 1));
            let chunker = TokenChunker::new(&counter, budget).unwrap();
            let counts = counter.count_all(&entries).unwrap();
            let chunks = chunker.make_chunks(&entries, &counts).unwrap();

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(chunk.token_count < max_input);
                prop_assert!(chunk.overlap_tokens <= budget.max_overlap_tokens);
                prop_assert!(!chunk.body().is_empty());
            }
        }

        #[test]
        fn prop_bodies_preserve_order(entries in entry_strategy()) {
            let counter = WordCounter;
            let budget = ChunkBudget::new().with_max_input(60).with_max_overlap(15);
            let chunker = TokenChunker::new(&counter, budget).unwrap();
            let counts = counter.count_all(&entries).unwrap();
            let chunks = chunker.make_chunks(&entries, &counts).unwrap();

            let original: Vec<&str> = entries.iter().flat_map(|e| e.split_whitespace()).collect();
            let rebuilt: Vec<&str> = chunks
                .iter()
                .flat_map(|c| c.body().split_whitespace())
                .collect();
            prop_assert_eq!(rebuilt, original);

            for pair in chunks.windows(2) {
                prop_assert!(pair[0].entry_range.start <= pair[1].entry_range.start);
            }
        }

        #[test]
        fn prop_overlap_is_suffix_of_previous_chunk(entries in entry_strategy()) {
            let counter = WordCounter;
            let budget = ChunkBudget::new().with_max_input(50).with_max_overlap(10);
            let chunker = TokenChunker::new(&counter, budget).unwrap();
            let counts = counter.count_all(&entries).unwrap();
            let chunks = chunker.make_chunks(&entries, &counts).unwrap();

            for pair in chunks.windows(2) {
                prop_assert!(pair[0].content.ends_with(pair[1].overlap()));
            }
        }
    }
}
