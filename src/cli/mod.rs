//! CLI layer for recap-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! chatting, summarizing saved chat logs and inspecting chunk plans.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{BudgetArgs, Cli, Commands, DEFAULT_OUT_DIR, ServiceArgs};
