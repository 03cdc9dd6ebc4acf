//! LLM client port for text completions.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Boxed future returned by [`LlmClient::complete`]; boxed to keep the trait dyn-compatible.
pub type LlmFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, GenerationError>> + Send + 'a>>;

/// A request to generate a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. `"claude-3-haiku-20240307"`).
    pub model: String,
    /// System preamble sent alongside the prompt.
    pub system: String,
    /// The user prompt.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// The response from a completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,
    /// Prompt tokens reported by the service.
    pub prompt_tokens: u32,
    /// Completion tokens reported by the service.
    pub completion_tokens: u32,
}

/// Sends completion requests to a language model.
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`]; everything except missing credentials
    /// is transient.
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_>;
}
