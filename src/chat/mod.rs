//! Interactive chat: session state, exit detection and the terminal loop.

pub mod repl;
pub mod session;

pub use repl::{MODERATION_NOTICE, Repl};
pub use session::{
    ANSWER_SEQUENCE, ChatConfig, ChatSession, DEFAULT_MAX_CONTEXT_QUESTIONS, EXIT_PHRASES,
    QUESTION_SEQUENCE, is_exit_phrase,
};
