//! Recursive chunk-and-consolidate summarization.

use crate::chunking::{ChunkBudget, TokenChunker};
use crate::error::{ChunkingError, Result, SummaryError};
use crate::llm::{CompletionProvider, RetryingProvider};
use crate::summary::SummaryConfig;
use crate::summary::prompt::build_prompt;
use crate::tokens::TokenCounter;
use futures_util::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a summarization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    /// The final summary.
    pub summary: String,
    /// Token count of the final summary.
    pub token_count: usize,
    /// Entries summarized.
    pub entries: usize,
    /// Chunks in the first phase.
    pub chunks: usize,
    /// Consolidation rounds performed.
    pub rounds: usize,
    /// Requests sent to the provider.
    pub requests: usize,
}

/// Which instructions a phase sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Summarize,
    Consolidate,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Consolidate => "consolidate",
        }
    }

    fn instructions(self, config: &SummaryConfig) -> &str {
        match self {
            Self::Summarize => &config.summary_instructions,
            Self::Consolidate => &config.consolidate_instructions,
        }
    }
}

/// Output of one phase.
struct PhaseOutput {
    texts: Vec<String>,
    tokens: usize,
    chunks: usize,
}

/// Summarizes an entry sequence into a single bounded summary.
///
/// The entries are chunked and each chunk is summarized; the summaries are
/// then chunked and consolidated, round after round, until exactly one
/// summary within `max_consolidated_tokens` remains. Consolidation runs at
/// least once.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use recap_rs::llm::{OpenAiProvider, ServiceConfig};
/// use recap_rs::summary::{SummaryConfig, SummaryEngine};
/// use recap_rs::tokens::TiktokenCounter;
///
/// # async fn run() -> recap_rs::Result<()> {
/// let provider = Arc::new(OpenAiProvider::new(&ServiceConfig::new("gpt-4o-mini")));
/// let counter = Arc::new(TiktokenCounter::gpt2()?);
/// let engine = SummaryEngine::new(provider, counter, SummaryConfig::new())?;
/// let summary = engine.summarize(&["You: hi\nEmmy: hello".to_string()]).await?;
/// # Ok(())
/// # }
/// ```
pub struct SummaryEngine {
    provider: Arc<dyn CompletionProvider>,
    counter: Arc<dyn TokenCounter>,
    config: SummaryConfig,
}

impl std::fmt::Debug for SummaryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryEngine")
            .field("model", &self.provider.model())
            .field("counter", &self.counter.name())
            .field("config", &self.config)
            .finish()
    }
}

impl SummaryEngine {
    /// Creates an engine. The provider is wrapped with the configured retry
    /// policy unless retries are disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the instructions
    /// leave no room for chunk text.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        counter: Arc<dyn TokenCounter>,
        config: SummaryConfig,
    ) -> Result<Self> {
        config.validate()?;
        for phase in [Phase::Summarize, Phase::Consolidate] {
            chunk_budget(counter.as_ref(), &config, phase)?;
        }
        let provider: Arc<dyn CompletionProvider> = if config.retry.max_retries > 0 {
            Arc::new(RetryingProvider::new(provider, config.retry.clone()))
        } else {
            provider
        };
        Ok(Self {
            provider,
            counter,
            config,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Summarizes `entries` into one string.
    ///
    /// # Errors
    ///
    /// See [`SummaryEngine::summarize_report`].
    pub async fn summarize(&self, entries: &[String]) -> Result<String> {
        Ok(self.summarize_report(entries).await?.summary)
    }

    /// Summarizes `entries`, reporting rounds and request counts.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::EmptyTranscript`] for no entries,
    /// [`SummaryError::NoProgress`] when a round shrinks neither the entry
    /// count nor the token total, [`SummaryError::RoundLimit`] when
    /// `max_rounds` rounds do not converge, and propagates tokenizer,
    /// chunking and provider errors.
    pub async fn summarize_report(&self, entries: &[String]) -> Result<SummaryReport> {
        if entries.is_empty() {
            return Err(SummaryError::EmptyTranscript.into());
        }

        let mut requests = 0;
        let first = self.run_phase(entries, Phase::Summarize, &mut requests).await?;
        tracing::info!(
            entries = entries.len(),
            chunks = first.chunks,
            tokens = first.tokens,
            "summarized transcript chunks"
        );

        let mut current = first.texts;
        let mut tokens = first.tokens;
        let mut round = 0;

        loop {
            round += 1;
            let (before_entries, before_tokens) = (current.len(), tokens);
            let output = self
                .run_phase(&current, Phase::Consolidate, &mut requests)
                .await?;
            current = output.texts;
            tokens = output.tokens;
            tracing::info!(
                round,
                entries = current.len(),
                tokens,
                "consolidation round complete"
            );

            if current.len() == 1 && tokens <= self.config.max_consolidated_tokens {
                break;
            }
            if current.len() >= before_entries && tokens >= before_tokens {
                return Err(SummaryError::NoProgress {
                    round,
                    entries: current.len(),
                    tokens,
                }
                .into());
            }
            if round >= self.config.max_rounds {
                return Err(SummaryError::RoundLimit { rounds: round }.into());
            }
        }

        let summary = current.into_iter().next().unwrap_or_default();
        Ok(SummaryReport {
            summary,
            token_count: tokens,
            entries: entries.len(),
            chunks: first.chunks,
            rounds: round,
            requests,
        })
    }

    /// Chunks `entries` and sends one request per chunk.
    async fn run_phase(
        &self,
        entries: &[String],
        phase: Phase,
        requests: &mut usize,
    ) -> Result<PhaseOutput> {
        let counts = self.counter.count_all(entries)?;
        let budget = chunk_budget(self.counter.as_ref(), &self.config, phase)?;
        let chunker = TokenChunker::new(self.counter.as_ref(), budget)?;
        let chunks = chunker.make_chunks(entries, &counts)?;
        if chunks.is_empty() {
            return Err(SummaryError::EmptyTranscript.into());
        }

        let instructions = phase.instructions(&self.config);
        let prompts: Vec<String> = chunks
            .iter()
            .map(|chunk| build_prompt(instructions, &chunk.content))
            .collect();
        *requests += prompts.len();

        let provider = &self.provider;
        let params = self.config.params;
        let texts: Vec<String> = stream::iter(prompts.iter().enumerate())
            .map(|(index, prompt)| async move {
                tracing::debug!(phase = phase.name(), chunk = index, "requesting completion");
                let text = provider.complete(prompt, &params).await?;
                Ok::<_, crate::Error>(text.trim().to_string())
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let tokens = self.counter.count_all(&texts)?.iter().sum();
        Ok(PhaseOutput {
            texts,
            tokens,
            chunks: chunks.len(),
        })
    }
}

/// Chunk budget left once the phase's instructions are counted.
fn chunk_budget(
    counter: &dyn TokenCounter,
    config: &SummaryConfig,
    phase: Phase,
) -> Result<ChunkBudget> {
    let header = counter.count(phase.instructions(config))?;
    let budget = config.budget;
    if header + budget.max_overlap_tokens >= budget.max_input_tokens {
        return Err(ChunkingError::InvalidConfig {
            reason: format!(
                "{} instructions ({header} tokens) plus overlap ({}) fill max_input_tokens ({})",
                phase.name(),
                budget.max_overlap_tokens,
                budget.max_input_tokens
            ),
        }
        .into());
    }
    Ok(budget.with_max_input(budget.max_input_tokens - header))
}
