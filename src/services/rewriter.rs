// Generative Rewriter
// Drives a text-generation capability through the paraphrase and
// multi-pass humanization prompts, with stage-local fallbacks.

use crate::services::enhancer::apply_table;
use crate::services::providers::ProviderError;
use crate::services::text_processor::clean_generated_text;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// External text-generation capability: prompt in, generated text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn name(&self) -> String {
        "generator".to_string()
    }
}

/// Generator used when nothing is configured; every call fails, so every
/// stage takes its fallback path.
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> String {
        "unavailable".to_string()
    }
}

/// Result of a single-call stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Generated(String),
    Fallback { text: String, reason: String },
}

impl StageOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Result of the multi-pass stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPassOutcome {
    pub text: String,
    pub passes_requested: u32,
    pub passes_completed: u32,
    /// Error that ended the loop before all passes ran.
    pub stopped_early: Option<String>,
}

impl MultiPassOutcome {
    pub fn is_complete(&self) -> bool {
        self.stopped_early.is_none()
    }
}

const BASIC_PARAPHRASE: &[(&str, &str)] = &[
    (r"(?i)\bmoreover\b", "also"),
    (r"(?i)\bfurthermore\b", "what's more"),
    (r"(?i)\badditionally\b", "plus"),
    (r"(?i)\bconsequently\b", "so"),
    (r"(?i)\bthus\b", "that's why"),
    (r"(?i)\bhence\b", "so"),
    (r"(?i)\bnevertheless\b", "still"),
    (r"(?i)\bwhereas\b", "while"),
    (r"(?i)\bwhilst\b", "while"),
    (r"(?i)\bIn conclusion\b", "So, to wrap this up"),
    (r"(?i)\bTo summarize\b", "Long story short"),
];

fn basic_paraphrase_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        BASIC_PARAPHRASE
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("basic paraphrase regex"), *r))
            .collect()
    })
}

/// Light word substitution used when the paraphrase call fails.
pub fn basic_paraphrase(text: &str) -> String {
    apply_table(text, basic_paraphrase_res())
}

pub fn paraphrase_prompt(text: &str) -> String {
    format!(
        r#"Rewrite this text to sound more natural and conversational while keeping the exact same meaning.
Break up any repetitive patterns, vary sentence structure, and make it sound like a human wrote it naturally.

Text to rewrite:
"{}"

Requirements:
- Keep the exact same meaning and information
- Keep approximately the same length
- Make it sound more conversational and natural
- Vary sentence length and structure
- Remove any repetitive phrases
- Don't add any new information

Rewritten text:"#,
        text
    )
}

pub fn humanize_pass_prompt(text: &str, pass: u32, passes: u32) -> String {
    format!(
        r#"This is pass {} of {} to make this text sound more human-written.

Current text:
"{}"

Make this text sound even more natural and human-like by:
- Adding conversational elements and filler words naturally
- Varying sentence rhythm and flow
- Making it sound like someone speaking naturally
- Keeping the exact same meaning

More human version:"#,
        pass, passes, text
    )
}

pub struct GenerativeRewriter {
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeRewriter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> String {
        self.generator.name()
    }

    async fn generate_clean(&self, prompt: &str) -> Result<String, GenerationError> {
        let raw = self.generator.generate(prompt).await?;
        let cleaned = clean_generated_text(&raw);
        if cleaned.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(cleaned)
    }

    /// One conversational rewrite; falls back to `basic_paraphrase`.
    pub async fn paraphrase(&self, text: &str) -> StageOutcome {
        let started = Instant::now();
        match self.generate_clean(&paraphrase_prompt(text)).await {
            Ok(out) => {
                info!(
                    "[REWRITER] paraphrase ok generator={} elapsed_ms={} chars_in={} chars_out={}",
                    self.generator.name(),
                    started.elapsed().as_millis(),
                    text.chars().count(),
                    out.chars().count()
                );
                StageOutcome::Generated(out)
            }
            Err(e) => {
                warn!("[REWRITER] paraphrase failed, using basic substitution: {}", e);
                StageOutcome::Fallback {
                    text: basic_paraphrase(text),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Sequential passes, each fed only the previous pass's output. The
    /// first failure ends the loop and keeps the last good text.
    pub async fn humanize_multi_pass(&self, text: &str, passes: u32) -> MultiPassOutcome {
        let mut current = text.to_string();
        let mut completed = 0;
        let mut stopped_early = None;

        for pass in 1..=passes {
            let started = Instant::now();
            match self
                .generate_clean(&humanize_pass_prompt(&current, pass, passes))
                .await
            {
                Ok(out) => {
                    info!(
                        "[REWRITER] humanize pass {}/{} ok elapsed_ms={} chars_out={}",
                        pass,
                        passes,
                        started.elapsed().as_millis(),
                        out.chars().count()
                    );
                    current = out;
                    completed = pass;
                }
                Err(e) => {
                    warn!("[REWRITER] humanize pass {}/{} failed: {}", pass, passes, e);
                    stopped_early = Some(e.to_string());
                    break;
                }
            }
        }

        MultiPassOutcome {
            text: current,
            passes_requested: passes,
            passes_completed: completed,
            stopped_early,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Replays scripted replies in order; `None` entries fail. Records prompts.
    pub struct ScriptedGenerator {
        replies: Mutex<Vec<Option<String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<Option<&str>>) -> Self {
            let mut replies: Vec<Option<String>> =
                replies.into_iter().map(|r| r.map(str::to_string)).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop() {
                Some(Some(reply)) => Ok(reply),
                _ => Err(GenerationError::Provider(ProviderError::RateLimited)),
            }
        }
    }

    /// Panics on every call.
    pub struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            panic!("generator crashed")
        }
    }

    /// Returns the same reply for every prompt.
    pub struct StaticGenerator(pub &'static str);

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }
}
