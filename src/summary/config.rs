//! Summary engine configuration.

use crate::chunking::{ChunkBudget, OversizePolicy};
use crate::error::{Error, Result};
use crate::llm::{CompletionParams, RetryConfig};
use crate::summary::prompt::{CONSOLIDATE_INSTRUCTIONS, PromptSet, SUMMARY_INSTRUCTIONS};
use serde::{Deserialize, Serialize};

/// Target size of the final summary, in tokens.
pub const DEFAULT_MAX_CONSOLIDATED_TOKENS: usize = 1500;

/// Consolidation rounds allowed before giving up.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Settings for one summarization run.
///
/// # Examples
///
/// ```
/// use recap_rs::summary::SummaryConfig;
///
/// let config = SummaryConfig::new()
///     .with_max_input(1000)
///     .with_max_overlap(100)
///     .with_max_consolidated(300)
///     .with_concurrency(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Per-request chunk budgets.
    #[serde(flatten)]
    pub budget: ChunkBudget,
    /// The final summary must be at most this many tokens.
    pub max_consolidated_tokens: usize,
    /// Instructions for chunk summaries.
    pub summary_instructions: String,
    /// Instructions for consolidation rounds.
    pub consolidate_instructions: String,
    /// Sampling parameters for every request.
    pub params: CompletionParams,
    /// Upper bound on consolidation rounds.
    pub max_rounds: usize,
    /// Requests in flight per phase.
    pub concurrency: usize,
    /// Backoff for transient service failures.
    pub retry: RetryConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            budget: ChunkBudget::new(),
            max_consolidated_tokens: DEFAULT_MAX_CONSOLIDATED_TOKENS,
            summary_instructions: SUMMARY_INSTRUCTIONS.to_string(),
            consolidate_instructions: CONSOLIDATE_INSTRUCTIONS.to_string(),
            params: CompletionParams::summary(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            concurrency: 1,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the per-request input budget.
    #[must_use]
    pub const fn with_max_input(mut self, tokens: usize) -> Self {
        self.budget.max_input_tokens = tokens;
        self
    }

    /// Sets the overlap budget.
    #[must_use]
    pub const fn with_max_overlap(mut self, tokens: usize) -> Self {
        self.budget.max_overlap_tokens = tokens;
        self
    }

    /// Sets the final summary budget.
    #[must_use]
    pub const fn with_max_consolidated(mut self, tokens: usize) -> Self {
        self.max_consolidated_tokens = tokens;
        self
    }

    /// Sets the oversize policy.
    #[must_use]
    pub const fn with_oversize(mut self, policy: OversizePolicy) -> Self {
        self.budget.oversize = policy;
        self
    }

    /// Sets the round limit.
    #[must_use]
    pub const fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Sets the number of concurrent requests per phase.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the sampling parameters.
    #[must_use]
    pub const fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Takes the instruction texts from a prompt set.
    #[must_use]
    pub fn with_prompts(mut self, prompts: &PromptSet) -> Self {
        self.summary_instructions.clone_from(&prompts.summary);
        self.consolidate_instructions.clone_from(&prompts.consolidate);
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns a chunking error for invalid budgets and [`Error::Config`]
    /// for a zero summary budget, round limit or concurrency.
    pub fn validate(&self) -> Result<()> {
        self.budget.validate()?;
        if self.max_consolidated_tokens == 0 {
            return Err(config_error("max_consolidated_tokens must be > 0"));
        }
        if self.max_rounds == 0 {
            return Err(config_error("max_rounds must be > 0"));
        }
        if self.concurrency == 0 {
            return Err(config_error("concurrency must be > 0"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> Error {
    Error::Config {
        message: message.to_string(),
    }
}
