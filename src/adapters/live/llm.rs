//! Live adapter for the `LlmClient` port using the Anthropic messages API.

use std::env;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::ports::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmFuture};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Live LLM client that calls the Anthropic API.
pub struct LiveLlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LiveLlmClient {
    /// Creates a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingCredentials`] for a blank key and
    /// [`GenerationError::Transport`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredentials(API_KEY_VAR));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_key, endpoint: ANTHROPIC_API_URL.to_string() })
    }

    /// Creates a client from [`API_KEY_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingCredentials`] when the variable is
    /// unset or empty.
    pub fn from_env() -> Result<Self, GenerationError> {
        let key = env::var(API_KEY_VAR).map_err(|_| GenerationError::MissingCredentials(API_KEY_VAR))?;
        Self::new(key)
    }

    /// Points the client at a different messages endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Request body sent to the messages API.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

/// A single message in the request.
#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the messages API.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

/// A content block in the response. Non-text blocks carry no `text`.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Token usage reported by the API.
#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Error response from the API.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

/// Detail inside an error response.
#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let body = AnthropicRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                system: &request.system,
                messages: vec![AnthropicMessage { role: "user", content: &request.prompt }],
            };

            debug!(model = %request.model, prompt_bytes = request.prompt.len(), "llm: sending request");
            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| GenerationError::Transport(format!("request failed: {e}")))?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| GenerationError::Transport(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                return Err(status_error(status, response_text));
            }

            parse_response(&response_text)
        })
    }
}

fn status_error(status: StatusCode, body: String) -> GenerationError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GenerationError::RateLimited;
    }
    let message =
        serde_json::from_str::<AnthropicError>(&body).map(|e| e.error.message).unwrap_or(body);
    GenerationError::Server { status: status.as_u16(), message }
}

fn parse_response(body: &str) -> Result<CompletionResponse, GenerationError> {
    let api_response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Decode(e.to_string()))?;

    let text = api_response.content.into_iter().map(|block| block.text).collect::<String>();
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(CompletionResponse {
        text,
        prompt_tokens: api_response.usage.input_tokens,
        completion_tokens: api_response.usage.output_tokens,
    })
}
