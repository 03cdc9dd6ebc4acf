//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::GenerationError;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Serves recorded completions from a cassette, in order.
///
/// Recorded failures come back as [`GenerationError::Replay`], as does an
/// exhausted cassette. Both are transient, so the pipeline skips the unit
/// and carries on.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Creates a replaying client backed by `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        let result = next_output(&self.replayer, "llm", "complete")
            .and_then(replay_result)
            .map_err(GenerationError::Replay);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn client(outputs: Vec<serde_json::Value>) -> ReplayingLlmClient {
        let interactions = outputs
            .into_iter()
            .enumerate()
            .map(|(seq, output)| Interaction {
                seq: seq as u64,
                port: "llm".into(),
                method: "complete".into(),
                input: json!({}),
                output,
            })
            .collect();
        let cassette =
            Cassette { name: "t".into(), recorded_at: Utc::now(), commit: "c".into(), interactions };
        ReplayingLlmClient::new(CassetteReplayer::new(&cassette))
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            system: String::new(),
            prompt: "p".into(),
            max_tokens: 1,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn serves_recorded_responses_then_errors() {
        let client = client(vec![
            json!({"Ok": {"text": "first", "prompt_tokens": 1, "completion_tokens": 2}}),
            json!({"Err": "server said no"}),
        ]);

        let first = client.complete(&request()).await.unwrap();
        assert_eq!(first.text, "first");

        let recorded = client.complete(&request()).await.unwrap_err();
        assert!(matches!(recorded, GenerationError::Replay(ref m) if m == "server said no"));

        let exhausted = client.complete(&request()).await.unwrap_err();
        assert!(exhausted.is_transient());
    }
}
