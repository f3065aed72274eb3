//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::chat::{ChatConfig, ChatSession, Repl};
use crate::chunking::TokenChunker;
use crate::cli::output::{
    OutputFormat, Plan, TokenReport, format_plan, format_session_end, format_summary,
    format_tokens, format_written,
};
use crate::cli::parser::{BudgetArgs, Cli, Commands, ServiceArgs};
use crate::core::Transcript;
use crate::error::{Result, SummaryError};
use crate::io::{SessionFiles, read_file};
use crate::llm::{
    CompletionProvider, OpenAiModerator, OpenAiProvider, RetryConfig, RetryingProvider,
};
use crate::summary::{PromptSet, SummaryEngine};
use crate::tokens::{TokenCounter, create_counter};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;

/// Options for the `chat` command.
struct ChatOptions<'a> {
    service: &'a ServiceArgs,
    budget: &'a BudgetArgs,
    max_context: usize,
    moderate: bool,
    summarize: bool,
}

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Chat {
            service,
            budget,
            max_context,
            no_moderation,
            no_summary,
        } => {
            let options = ChatOptions {
                service,
                budget,
                max_context: *max_context,
                moderate: !*no_moderation,
                summarize: !*no_summary,
            };
            cmd_chat(cli, &options, format).await
        }
        Commands::Summarize {
            log,
            service,
            budget,
        } => cmd_summarize(cli, log, service, budget, format).await,
        Commands::Plan {
            log,
            budget,
            preview_len,
        } => cmd_plan(cli, log, budget, *preview_len, format),
        Commands::Tokens { file } => cmd_tokens(&cli.encoding, file, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir, format),
    }
}

fn load_counter(encoding: &str) -> Result<Arc<dyn TokenCounter>> {
    let counter = create_counter(encoding)?;
    tracing::debug!(encoding = counter.name(), "token counter ready");
    Ok(Arc::from(counter))
}

fn build_engine(
    cli: &Cli,
    provider: Arc<dyn CompletionProvider>,
    budget: &BudgetArgs,
    prompts: &PromptSet,
) -> Result<SummaryEngine> {
    let counter = load_counter(&cli.encoding)?;
    SummaryEngine::new(provider, counter, budget.summary_config(prompts))
}

async fn cmd_chat(cli: &Cli, options: &ChatOptions<'_>, format: OutputFormat) -> Result<String> {
    let prompts = PromptSet::load(cli.prompt_dir.as_deref())?;
    let config = ChatConfig {
        persona: prompts.persona.clone(),
        assistant_name: cli.assistant.clone(),
        max_context_questions: options.max_context,
        ..ChatConfig::default()
    };

    // a bad budget fails here, before the session starts
    let service = options.service.service_config();
    let client = service.client();
    let provider = Arc::new(OpenAiProvider::with_client(client.clone(), &service.model));
    let engine = build_engine(cli, provider.clone(), options.budget, &prompts)?;
    let moderator = OpenAiModerator::new(client);
    let chat_provider =
        RetryingProvider::new(provider, RetryConfig::with_retries(options.budget.retries));

    let files = SessionFiles::new(&cli.out_dir, &Local::now());
    tracing::info!(
        model = %service.model,
        chat_log = %files.chat_log().display(),
        "chat session started"
    );

    let mut repl = Repl::new(
        ChatSession::new(config),
        &chat_provider,
        &files,
        std::io::stdout(),
    )
    .with_color(!cli.no_color);
    if options.moderate {
        repl = repl.with_moderator(&moderator);
    }
    let transcript = repl.run(BufReader::new(tokio::io::stdin())).await?;

    if transcript.is_empty() || !options.summarize {
        return format_session_end(files.chat_log(), transcript.len(), format);
    }

    let report = engine.summarize_report(&transcript.entries()).await?;
    let saved = files.save_summary(&report.summary, &Local::now())?;
    format_summary(&report, Some(&saved), format)
}

async fn cmd_summarize(
    cli: &Cli,
    log: &Path,
    service: &ServiceArgs,
    budget: &BudgetArgs,
    format: OutputFormat,
) -> Result<String> {
    let transcript = load_transcript(log, &cli.assistant)?;

    let prompts = PromptSet::load(cli.prompt_dir.as_deref())?;
    let provider = Arc::new(OpenAiProvider::new(&service.service_config()));
    let engine = build_engine(cli, provider, budget, &prompts)?;

    let report = engine.summarize_report(&transcript.entries()).await?;
    let files = SessionFiles::for_log(&cli.out_dir, log);
    let saved = files.save_summary(&report.summary, &Local::now())?;
    format_summary(&report, Some(&saved), format)
}

fn cmd_plan(
    cli: &Cli,
    log: &Path,
    budget: &BudgetArgs,
    preview_len: usize,
    format: OutputFormat,
) -> Result<String> {
    let transcript = load_transcript(log, &cli.assistant)?;
    let entries = transcript.entries();

    let counter = load_counter(&cli.encoding)?;
    let counts = counter.count_all(&entries)?;
    let chunk_budget = budget.chunk_budget();
    let chunker = TokenChunker::new(counter.as_ref(), chunk_budget)?;
    let chunks = chunker.make_chunks(&entries, &counts)?;

    let plan = Plan {
        encoding: counter.name(),
        entries: entries.len(),
        entry_tokens: counts.iter().sum(),
        max_input_tokens: chunk_budget.max_input_tokens,
        max_overlap_tokens: chunk_budget.max_overlap_tokens,
        chunks: &chunks,
    };
    format_plan(&plan, preview_len, format)
}

fn cmd_tokens(encoding: &str, file: &Path, format: OutputFormat) -> Result<String> {
    let content = read_file(file)?;
    let counter = load_counter(encoding)?;
    let report = TokenReport {
        path: file,
        encoding: counter.name(),
        tokens: counter.count(&content)?,
        chars: content.chars().count(),
        bytes: content.len(),
    };
    format_tokens(&report, format)
}

fn cmd_init_prompts(dir: &Path, format: OutputFormat) -> Result<String> {
    let written = PromptSet::write_defaults(dir)?;
    format_written(dir, &written, format)
}

/// Reads and parses a chat log, rejecting logs without exchanges.
fn load_transcript(log: &Path, assistant_name: &str) -> Result<Transcript> {
    let content = read_file(log)?;
    let transcript = Transcript::parse(&content, assistant_name).with_source(log);
    if transcript.is_empty() {
        return Err(SummaryError::EmptyTranscript.into());
    }
    tracing::debug!(
        log = %log.display(),
        exchanges = transcript.len(),
        "parsed chat log"
    );
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    const LOG: &str = "You: What is tea?\nEmmy: A drink made from leaves.\n\
        You: Is it hot?\nEmmy: Usually.\nIt can be iced too.\nYou: bye\n";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["recap-rs", "--encoding", "heuristic"].iter().chain(args)).unwrap()
    }

    #[tokio::test]
    async fn test_plan_command() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("chat.txt");
        fs::write(&log, LOG).unwrap();

        let path = log.to_string_lossy().to_string();
        let cli = parse(&[
            "--format",
            "json",
            "plan",
            &path,
            "--max-input-tokens",
            "12",
            "--max-overlap-tokens",
            "3",
        ]);
        let output = execute(&cli).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["entries"], 2);
        assert_eq!(value["encoding"], "heuristic");
        let chunks = value["chunks"].as_array().unwrap();
        assert!(chunks.len() >= 2);
        for chunk in chunks {
            assert!(chunk["token_count"].as_u64().unwrap() < 12);
            assert!(chunk["overlap_tokens"].as_u64().unwrap() <= 3);
        }
    }

    #[tokio::test]
    async fn test_plan_empty_log() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("chat.txt");
        fs::write(&log, "You: bye\n").unwrap();

        let path = log.to_string_lossy().to_string();
        let result = execute(&parse(&["plan", &path])).await;
        assert!(matches!(
            result,
            Err(crate::Error::Summary(SummaryError::EmptyTranscript))
        ));
    }

    #[tokio::test]
    async fn test_tokens_command() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        fs::write(&file, "abcdefgh").unwrap();

        let path = file.to_string_lossy().to_string();
        let output = execute(&parse(&["tokens", &path])).await.unwrap();
        assert!(output.contains("Tokens:    2 (heuristic)"));
        assert!(output.contains("Bytes:     8"));
    }

    #[tokio::test]
    async fn test_init_prompts_command() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("prompts");
        let path = dir.to_string_lossy().to_string();

        let output = execute(&parse(&["init-prompts", &path])).await.unwrap();
        assert_eq!(output.lines().count(), 3);
        assert!(dir.join("persona.txt").exists());

        let again = execute(&parse(&["init-prompts", &path])).await.unwrap();
        assert!(again.starts_with("All instruction files already exist"));
    }
}
