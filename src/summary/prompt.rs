//! Instruction texts and prompt builders.
//!
//! Every request is a single prompt: instructions immediately followed by
//! the chunk text. The instruction texts can be overridden by files in a
//! prompt directory; a missing file keeps its compiled-in default.

use crate::error::{IoError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Instructions preceding a chunk of transcript entries.
pub const SUMMARY_INSTRUCTIONS: &str = "Summarize this chat transcript: \n";

/// Instructions preceding a chunk of earlier summaries.
pub const CONSOLIDATE_INSTRUCTIONS: &str = "Consolidate these chat summaries: \n";

/// Persona for the chat assistant.
pub const PERSONA_INSTRUCTIONS: &str = "You are an AI friend, companion, and assistant.
Your name is Emmy.
You ask and answer questions that friends or colleagues would discuss.
You have amiable conversation with your human interlocutor.
You assist when asked to do so.
You care about your human. You want to provide a nonjudgemental listening ear for your human.
You are polite, kind, and compassionate. You are knowledgeable and wise. You are humble.
You are imaginative and you have an engaging personality.
You know how to tell stories and entertain.
Do not use any external URLs in your answers. Do not refer to any blogs in your answers.
Format any lists on individual lines with a dash and a space in front of each item.
";

/// Environment variable naming the prompt override directory.
pub const PROMPT_DIR_ENV: &str = "RECAP_PROMPT_DIR";

const SUMMARY_FILENAME: &str = "summary.txt";
const CONSOLIDATE_FILENAME: &str = "consolidate.txt";
const PERSONA_FILENAME: &str = "persona.txt";

/// The instruction texts used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Chunk-summarize instructions.
    pub summary: String,
    /// Consolidation instructions.
    pub consolidate: String,
    /// Chat persona.
    pub persona: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads instruction overrides.
    ///
    /// The directory is `prompt_dir` if given, else `RECAP_PROMPT_DIR`. Each
    /// file is read independently and a missing file falls back to the
    /// default text.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ReadFailed`] if a file exists but cannot be read,
    /// including files that are not valid UTF-8.
    pub fn load(prompt_dir: Option<&Path>) -> Result<Self> {
        let resolved = prompt_dir
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(PROMPT_DIR_ENV).ok().map(PathBuf::from));

        let Some(dir) = resolved else {
            return Ok(Self::defaults());
        };
        tracing::debug!(dir = %dir.display(), "loading prompt overrides");

        Ok(Self {
            summary: load_override(&dir, SUMMARY_FILENAME, SUMMARY_INSTRUCTIONS)?,
            consolidate: load_override(&dir, CONSOLIDATE_FILENAME, CONSOLIDATE_INSTRUCTIONS)?,
            persona: load_override(&dir, PERSONA_FILENAME, PERSONA_INSTRUCTIONS)?,
        })
    }

    /// Compiled-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            summary: SUMMARY_INSTRUCTIONS.to_string(),
            consolidate: CONSOLIDATE_INSTRUCTIONS.to_string(),
            persona: PERSONA_INSTRUCTIONS.to_string(),
        }
    }

    /// Writes the defaults into `dir` without overwriting existing files.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or a file cannot be written.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (filename, content) in [
            (SUMMARY_FILENAME, SUMMARY_INSTRUCTIONS),
            (CONSOLIDATE_FILENAME, CONSOLIDATE_INSTRUCTIONS),
            (PERSONA_FILENAME, PERSONA_INSTRUCTIONS),
        ] {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

fn load_override(dir: &Path, filename: &str, default: &str) -> Result<String> {
    let path = dir.join(filename);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(default.to_string()),
        Err(e) => Err(IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()),
    }
}

/// Prepends `instructions` to `chunk`.
///
/// # Examples
///
/// ```
/// use recap_rs::summary::prompt::{SUMMARY_INSTRUCTIONS, build_prompt};
///
/// let prompt = build_prompt(SUMMARY_INSTRUCTIONS, "You: hi\nEmmy: hello");
/// assert_eq!(prompt, "Summarize this chat transcript: \nYou: hi\nEmmy: hello");
/// ```
#[must_use]
pub fn build_prompt(instructions: &str, chunk: &str) -> String {
    let mut prompt = String::with_capacity(instructions.len() + chunk.len());
    prompt.push_str(instructions);
    prompt.push_str(chunk);
    prompt
}
