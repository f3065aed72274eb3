//! Core domain models for recap.
//!
//! Exchanges, transcripts and chunks. These are pure value types with no
//! I/O dependencies; they are never mutated after the pipeline hands them on.

pub mod chunk;
pub mod exchange;
pub mod transcript;

pub use chunk::Chunk;
pub use exchange::Exchange;
pub use transcript::{DEFAULT_ASSISTANT_NAME, ERROR_LABEL, Transcript, USER_LABEL};
