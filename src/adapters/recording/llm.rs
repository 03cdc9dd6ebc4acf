//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a recording client wrapping `inner`.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Cassette;
    use crate::error::GenerationError;
    use crate::ports::CompletionResponse;

    struct ScriptedClient;

    impl LlmClient for ScriptedClient {
        fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
            let ok = !request.prompt.contains("fail");
            Box::pin(async move {
                if ok {
                    Ok(CompletionResponse {
                        text: "summary".into(),
                        prompt_tokens: 3,
                        completion_tokens: 1,
                    })
                } else {
                    Err(GenerationError::RateLimited)
                }
            })
        }
    }

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            system: "s".into(),
            prompt: prompt.into(),
            max_tokens: 10,
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn records_successes_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "abc")));

        {
            let client = RecordingLlmClient::new(Box::new(ScriptedClient), Arc::clone(&recorder));
            assert!(client.complete(&request("hello")).await.is_ok());
            assert!(client.complete(&request("fail please")).await.is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].output["Ok"]["text"], "summary");
        assert_eq!(cassette.interactions[0].input["prompt"], "hello");
        assert_eq!(
            cassette.interactions[1].output["Err"],
            "rate limited by the generation service"
        );
    }
}
