//! Generator collaborator: turns a context text into a summary.
//!
//! Two variants exist and one is picked at startup: [`PlaceholderGenerator`]
//! for runs without a generation service, and [`LlmGenerator`] which goes
//! through the cache, the rate limiter and an [`LlmClient`](crate::ports::LlmClient).

mod llm;
mod prompt;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::ratelimit::RateLimiter;

pub use llm::{LlmGenerator, LlmSettings};
pub use prompt::{build_prompt, estimate_tokens, SYSTEM_PREAMBLE};

/// What a summary is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// Whole-repository overview.
    Architecture,
    /// One key directory.
    Module,
    /// Role of one file.
    File,
    /// Bullet list of one file's key declarations.
    Function,
    /// Bullet list of setup and run steps.
    Quickstart,
}

impl SummaryKind {
    /// Lowercase tag used in prompts, placeholders and cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Module => "module",
            Self::File => "file",
            Self::Function => "function",
            Self::Quickstart => "quickstart",
        }
    }

    /// Default size constraints for this kind.
    #[must_use]
    pub fn default_constraints(self) -> Constraints {
        match self {
            Self::Architecture => Constraints::words(180),
            Self::Module => Constraints::words(80),
            Self::File => Constraints::words(120),
            Self::Function | Self::Quickstart => Constraints::bullets(8),
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds on the size of a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Word limit for prose summaries.
    pub max_words: Option<u32>,
    /// Bullet limit for list summaries.
    pub max_bullets: Option<u32>,
}

impl Constraints {
    /// A word-limited constraint.
    #[must_use]
    pub fn words(max_words: u32) -> Self {
        Self { max_words: Some(max_words), max_bullets: None }
    }

    /// A bullet-limited constraint.
    #[must_use]
    pub fn bullets(max_bullets: u32) -> Self {
        Self { max_words: None, max_bullets: Some(max_bullets) }
    }
}

/// One summarization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Kind of summary.
    pub kind: SummaryKind,
    /// Context text shown to the generation service.
    pub context: String,
    /// Size constraints.
    pub constraints: Constraints,
    /// Caller-supplied cache key; derived from the other fields when absent.
    pub cache_key: Option<String>,
}

impl SummaryRequest {
    /// A request using the kind's default constraints and no explicit key.
    #[must_use]
    pub fn new(kind: SummaryKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            constraints: kind.default_constraints(),
            cache_key: None,
        }
    }

    /// Sets the explicit cache key.
    #[must_use]
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

/// Outcome of a summarization call. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Summary text.
    pub text: String,
    /// Whether the text came from the cache.
    pub cached: bool,
    /// Approximate tokens spent (0 for placeholders).
    pub token_estimate: usize,
}

/// Produces summaries.
///
/// The limiter is lent per call so one instance spaces every outbound
/// request of a run.
pub trait Generator {
    /// Summarizes `request`.
    ///
    /// # Errors
    ///
    /// Returns a transient [`GenerationError`] when the call fails; the
    /// caller skips that unit of work.
    fn summarize(
        &self,
        request: &SummaryRequest,
        limiter: &mut RateLimiter,
    ) -> Result<GenerationResult, GenerationError>;

    /// Whether results are real summaries rather than fixed placeholders.
    fn is_live(&self) -> bool {
        true
    }
}

/// Returns `[<kind> summary placeholder - dry run mode]` for every call.
///
/// No network access, no cache writes, no rate limiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    /// The fixed placeholder for `kind`.
    #[must_use]
    pub fn text_for(kind: SummaryKind) -> String {
        format!("[{kind} summary placeholder - dry run mode]")
    }
}

impl Generator for PlaceholderGenerator {
    fn summarize(
        &self,
        request: &SummaryRequest,
        _limiter: &mut RateLimiter,
    ) -> Result<GenerationResult, GenerationError> {
        Ok(GenerationResult {
            text: Self::text_for(request.kind),
            cached: false,
            token_estimate: 0,
        })
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_names_the_kind() {
        let mut limiter = RateLimiter::new(1.0);
        let result = PlaceholderGenerator
            .summarize(&SummaryRequest::new(SummaryKind::Module, "ctx"), &mut limiter)
            .unwrap();
        assert_eq!(result.text, "[module summary placeholder - dry run mode]");
        assert!(!result.cached);
        assert_eq!(result.token_estimate, 0);
    }

    #[test]
    fn default_constraints_per_kind() {
        assert_eq!(SummaryKind::Architecture.default_constraints(), Constraints::words(180));
        assert_eq!(SummaryKind::File.default_constraints().max_words, Some(120));
        assert_eq!(SummaryKind::Quickstart.default_constraints().max_bullets, Some(8));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SummaryKind::Function).unwrap(), "\"function\"");
    }
}
