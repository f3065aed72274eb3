//! BPE token counting via `tiktoken-rs`.
//!
//! The default encoding is GPT-2 (`r50k_base`), the scheme the completion
//! models account context length in. Newer chat models use `cl100k_base` or
//! `o200k_base`; pick the one matching the configured model.

use crate::Result;
use crate::error::TokenizerError;
use crate::tokens::TokenCounter;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Supported BPE encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// GPT-2 / `r50k_base`.
    Gpt2,
    /// `p50k_base`.
    P50k,
    /// `cl100k_base`.
    Cl100k,
    /// `o200k_base`.
    O200k,
}

impl Encoding {
    /// Parses an encoding name (case-insensitive). `r50k_base` is accepted as
    /// an alias of `gpt2`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownEncoding`] for unrecognized names.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "gpt2" | "r50k_base" => Ok(Self::Gpt2),
            "p50k_base" => Ok(Self::P50k),
            "cl100k_base" => Ok(Self::Cl100k),
            "o200k_base" => Ok(Self::O200k),
            _ => Err(TokenizerError::UnknownEncoding {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Canonical encoding name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gpt2 => "gpt2",
            Self::P50k => "p50k_base",
            Self::Cl100k => "cl100k_base",
            Self::O200k => "o200k_base",
        }
    }

    fn load(self) -> Result<CoreBPE> {
        let loaded = match self {
            Self::Gpt2 => tiktoken_rs::r50k_base(),
            Self::P50k => tiktoken_rs::p50k_base(),
            Self::Cl100k => tiktoken_rs::cl100k_base(),
            Self::O200k => tiktoken_rs::o200k_base(),
        };
        loaded.map_err(|e| {
            TokenizerError::Encoding {
                encoding: self.name().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Token counter backed by a `tiktoken` byte-pair encoding.
///
/// # Examples
///
/// ```
/// use recap_rs::tokens::{Encoding, TiktokenCounter, TokenCounter};
///
/// let counter = TiktokenCounter::new(Encoding::Gpt2).unwrap();
/// assert_eq!(counter.count("Hello world").unwrap(), 2);
/// ```
#[derive(Clone)]
pub struct TiktokenCounter {
    encoding: Encoding,
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl TiktokenCounter {
    /// Loads the BPE tables for `encoding`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Encoding`] if the tables cannot be loaded.
    pub fn new(encoding: Encoding) -> Result<Self> {
        Ok(Self {
            encoding,
            bpe: Arc::new(encoding.load()?),
        })
    }

    /// Loads the default GPT-2 encoding.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Encoding`] if the tables cannot be loaded.
    pub fn gpt2() -> Result<Self> {
        Self::new(Encoding::Gpt2)
    }

    /// Returns the encoding in use.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }

    fn name(&self) -> &'static str {
        self.encoding.name()
    }
}
