//! I/O utilities for recap.
//!
//! File reading and writing, session file layout, and Unicode helpers.

pub mod persist;
pub mod reader;
pub mod unicode;

pub use persist::{SavedSummary, SessionFiles, chat_log_name};
pub use reader::{append_file, read_file, write_file};
pub use unicode::{find_char_boundary, find_char_boundary_forward};
