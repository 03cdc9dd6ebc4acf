//! Generator backed by an LLM client, the on-disk cache and the rate limiter.

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use super::prompt::{build_prompt, estimate_tokens, SYSTEM_PREAMBLE};
use super::{GenerationResult, Generator, SummaryRequest};
use crate::cache::{Cache, CacheEntry, CacheKey};
use crate::error::GenerationError;
use crate::ports::{CompletionRequest, LlmClient};
use crate::ratelimit::RateLimiter;

/// Default model.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
/// Sampling temperature for every call.
pub const TEMPERATURE: f32 = 0.2;

/// Per-request model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Model identifier.
    pub model: String,
    /// Completion token limit.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.to_string(), max_tokens: DEFAULT_MAX_TOKENS }
    }
}

/// Generator that consults the cache, waits on the limiter, then calls the
/// LLM client and stores the result.
///
/// The pipeline is synchronous; the async client runs on a private
/// current-thread runtime.
pub struct LlmGenerator {
    client: Box<dyn LlmClient>,
    cache: Cache,
    settings: LlmSettings,
    runtime: Runtime,
}

impl LlmGenerator {
    /// Wraps `client`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Transport`] if the runtime cannot start.
    pub fn new(
        client: Box<dyn LlmClient>,
        cache: Cache,
        settings: LlmSettings,
    ) -> Result<Self, GenerationError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to start runtime: {e}")))?;
        Ok(Self { client, cache, settings, runtime })
    }

    fn cache_key(request: &SummaryRequest) -> CacheKey {
        match &request.cache_key {
            Some(key) => CacheKey::explicit(key),
            None => CacheKey::derived(request.kind, &request.context, request.constraints),
        }
    }
}

impl Generator for LlmGenerator {
    fn summarize(
        &self,
        request: &SummaryRequest,
        limiter: &mut RateLimiter,
    ) -> Result<GenerationResult, GenerationError> {
        let key = Self::cache_key(request);
        if let Some(entry) = self.cache.get(&key) {
            return Ok(GenerationResult {
                text: entry.summary,
                cached: true,
                token_estimate: entry.token_estimate,
            });
        }

        let completion = CompletionRequest {
            model: self.settings.model.clone(),
            system: SYSTEM_PREAMBLE.to_string(),
            prompt: build_prompt(request),
            max_tokens: self.settings.max_tokens,
            temperature: TEMPERATURE,
        };

        limiter.wait();
        info!(kind = %request.kind, key = key.as_str(), "generating summary");
        let response = self.runtime.block_on(self.client.complete(&completion))?;

        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        let token_estimate =
            estimate_tokens(&format!("{}{}", completion.system, completion.prompt), &text);
        debug!(token_estimate, "summary received");

        let entry = CacheEntry {
            key: key.as_str().to_string(),
            summary: text.clone(),
            reused: false,
            token_estimate,
        };
        if let Err(err) = self.cache.put(&key, &entry) {
            warn!("cache: failed to store {}: {err}", key.as_str());
        }

        Ok(GenerationResult { text, cached: false, token_estimate })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::SummaryKind;
    use crate::ports::{CompletionResponse, LlmFuture};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingClient {
        calls: Arc<AtomicUsize>,
        reply: &'static str,
    }

    impl LlmClient for CountingClient {
        fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = self.reply.to_string();
            Box::pin(async move {
                Ok(CompletionResponse { text, prompt_tokens: 1, completion_tokens: 1 })
            })
        }
    }

    fn generator(dir: &std::path::Path, force: bool, reply: &'static str) -> (LlmGenerator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = CountingClient { calls: Arc::clone(&calls), reply };
        let generator =
            LlmGenerator::new(Box::new(client), Cache::new(dir, force), LlmSettings::default()).unwrap();
        (generator, calls)
    }

    #[test]
    fn second_identical_call_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, calls) = generator(dir.path(), false, "  A tidy summary.\n");
        let mut limiter = RateLimiter::new(1000.0);
        let request = SummaryRequest::new(SummaryKind::Architecture, "Repository: demo");

        let first = generator.summarize(&request, &mut limiter).unwrap();
        let second = generator.summarize(&request, &mut limiter).unwrap();

        assert_eq!(first.text, "A tidy summary.");
        assert!(!first.cached);
        assert!(first.token_estimate > 0);
        assert_eq!(second.text, first.text);
        assert!(second.cached);
        assert_eq!(second.token_estimate, first.token_estimate);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_key_names_the_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = generator(dir.path(), false, "role");
        let mut limiter = RateLimiter::new(1000.0);
        let request = SummaryRequest::new(SummaryKind::File, "File: a.go").with_cache_key("abc123");

        generator.summarize(&request, &mut limiter).unwrap();

        assert!(dir.path().join("abc123.json").exists());
    }

    #[test]
    fn force_calls_again_but_rewrites_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, calls) = generator(dir.path(), true, "fresh");
        let mut limiter = RateLimiter::new(1000.0);
        let request = SummaryRequest::new(SummaryKind::Module, "Module: x");

        generator.summarize(&request, &mut limiter).unwrap();
        generator.summarize(&request, &mut limiter).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn blank_reply_is_empty_response() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = generator(dir.path(), false, "   ");
        let mut limiter = RateLimiter::new(1000.0);
        let err = generator
            .summarize(&SummaryRequest::new(SummaryKind::File, "x"), &mut limiter)
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
