//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::chat::DEFAULT_MAX_CONTEXT_QUESTIONS;
use crate::chunking::{
    ChunkBudget, DEFAULT_MAX_INPUT_TOKENS, DEFAULT_MAX_OVERLAP_TOKENS, OversizePolicy,
};
use crate::core::DEFAULT_ASSISTANT_NAME;
use crate::llm::{DEFAULT_MODEL, RetryConfig, ServiceConfig};
use crate::summary::{
    DEFAULT_MAX_CONSOLIDATED_TOKENS, DEFAULT_MAX_ROUNDS, PromptSet, SummaryConfig,
};
use crate::tokens::DEFAULT_ENCODING;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default directory for chat logs and summaries.
pub const DEFAULT_OUT_DIR: &str = ".recap";

/// recap-rs: chat assistant with bounded transcript summaries.
///
/// Chats through an OpenAI-compatible service and summarizes arbitrarily
/// long transcripts by token-budgeted chunking and recursive consolidation.
#[derive(Parser, Debug)]
#[command(name = "recap-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Token encoding (gpt2, p50k_base, cl100k_base, o200k_base, heuristic).
    #[arg(long, env = "RECAP_ENCODING", default_value = DEFAULT_ENCODING, global = true)]
    pub encoding: String,

    /// Directory for chat logs and summaries.
    #[arg(long, env = "RECAP_OUT_DIR", default_value = DEFAULT_OUT_DIR, global = true)]
    pub out_dir: PathBuf,

    /// Name the assistant answers under in chat logs.
    #[arg(long, default_value = DEFAULT_ASSISTANT_NAME, global = true)]
    pub assistant: String,

    /// Directory with instruction overrides (summary.txt, consolidate.txt, persona.txt).
    #[arg(long, env = "RECAP_PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// Disable colored chat output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session.
    ///
    /// The session is logged under the output directory and summarized when
    /// it ends.
    Chat {
        /// Service connection.
        #[command(flatten)]
        service: ServiceArgs,

        /// Summary budgets.
        #[command(flatten)]
        budget: BudgetArgs,

        /// Previous exchanges sent with each question.
        #[arg(long, default_value_t = DEFAULT_MAX_CONTEXT_QUESTIONS)]
        max_context: usize,

        /// Skip the moderation check.
        #[arg(long)]
        no_moderation: bool,

        /// Do not summarize the session at exit.
        #[arg(long)]
        no_summary: bool,
    },

    /// Summarize a saved chat log.
    Summarize {
        /// Path to the chat log.
        log: PathBuf,

        /// Service connection.
        #[command(flatten)]
        service: ServiceArgs,

        /// Summary budgets.
        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Show how a chat log would be chunked, without calling the service.
    Plan {
        /// Path to the chat log.
        log: PathBuf,

        /// Summary budgets.
        #[command(flatten)]
        budget: BudgetArgs,

        /// Preview length per chunk in bytes (text output).
        #[arg(long, default_value = "60")]
        preview_len: usize,
    },

    /// Count the tokens in a file.
    Tokens {
        /// Path to the file.
        file: PathBuf,
    },

    /// Write the default instruction files to a directory.
    InitPrompts {
        /// Target directory (existing files are kept).
        dir: PathBuf,
    },
}

/// Connection settings for the generative service.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name.
    #[arg(long, env = "RECAP_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API base URL for OpenAI-compatible endpoints.
    #[arg(long, env = "RECAP_BASE_URL")]
    pub base_url: Option<String>,
}

impl ServiceArgs {
    /// Builds the service settings.
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(&self.model);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        config
    }
}

/// Token budgets and engine limits.
#[derive(Args, Debug, Clone)]
pub struct BudgetArgs {
    /// Tokens per request; every chunk stays strictly below this.
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_TOKENS)]
    pub max_input_tokens: usize,

    /// Tokens of the previous chunk carried into the next.
    #[arg(long, default_value_t = DEFAULT_MAX_OVERLAP_TOKENS)]
    pub max_overlap_tokens: usize,

    /// Token budget of the final summary.
    #[arg(long, default_value_t = DEFAULT_MAX_CONSOLIDATED_TOKENS)]
    pub max_consolidated_tokens: usize,

    /// Handling of entries larger than a chunk (split, reject).
    #[arg(long, default_value = "split")]
    pub oversize: OversizePolicy,

    /// Maximum consolidation rounds.
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,

    /// Concurrent requests per phase.
    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    /// Retries for transient service failures.
    #[arg(long, default_value = "2")]
    pub retries: u32,
}

impl BudgetArgs {
    /// Chunk budgets for planning.
    #[must_use]
    pub const fn chunk_budget(&self) -> ChunkBudget {
        ChunkBudget::new()
            .with_max_input(self.max_input_tokens)
            .with_max_overlap(self.max_overlap_tokens)
            .with_oversize(self.oversize)
    }

    /// Engine configuration with instructions from `prompts`.
    #[must_use]
    pub fn summary_config(&self, prompts: &PromptSet) -> SummaryConfig {
        SummaryConfig::new()
            .with_max_input(self.max_input_tokens)
            .with_max_overlap(self.max_overlap_tokens)
            .with_max_consolidated(self.max_consolidated_tokens)
            .with_oversize(self.oversize)
            .with_max_rounds(self.max_rounds)
            .with_concurrency(self.concurrency)
            .with_retry(RetryConfig::with_retries(self.retries))
            .with_prompts(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_defaults() {
        let cli = Cli::try_parse_from(["recap-rs", "plan", "chat.txt"]).unwrap();
        assert_eq!(cli.format, "text");
        assert_eq!(cli.assistant, "Emmy");
        let Commands::Plan { log, budget, .. } = cli.command else {
            unreachable!("expected plan");
        };
        assert_eq!(log, PathBuf::from("chat.txt"));
        assert_eq!(budget.chunk_budget(), ChunkBudget::new());
    }

    #[test]
    fn test_budget_flags() {
        let cli = Cli::try_parse_from([
            "recap-rs",
            "--format",
            "json",
            "summarize",
            "chat.txt",
            "--max-input-tokens",
            "250",
            "--max-overlap-tokens",
            "20",
            "--oversize",
            "reject",
            "--concurrency",
            "4",
            "--retries",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.format, "json");
        let Commands::Summarize { budget, .. } = cli.command else {
            unreachable!("expected summarize");
        };
        let config = budget.summary_config(&PromptSet::defaults());
        assert_eq!(config.budget.max_input_tokens, 250);
        assert_eq!(config.budget.max_overlap_tokens, 20);
        assert_eq!(config.budget.oversize, OversizePolicy::Reject);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn test_invalid_oversize_rejected() {
        let result = Cli::try_parse_from(["recap-rs", "plan", "chat.txt", "--oversize", "drop"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_service_args() {
        let args = ServiceArgs {
            api_key: Some("sk-test-1234567890".to_string()),
            model: "gpt-4o".to_string(),
            base_url: Some("http://localhost:8080/v1".to_string()),
        };
        let config = args.service_config();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(config.api_key.is_some());
    }
}
