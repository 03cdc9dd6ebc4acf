//! Service context: the LLM client for a run, plus an optional recorder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapters::live::LiveLlmClient;
use crate::adapters::recording::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::{CodedocError, GenerationError};
use crate::ports::llm::LlmClient;

/// Revision marker stored in recorded cassettes.
const RECORDER_COMMIT: &str = concat!("codedoc-", env!("CARGO_PKG_VERSION"));

/// Bundles the LLM port for one run.
///
/// Constructors wire different adapters: live, recording (live plus a
/// cassette written at the end) or replaying.
pub struct ServiceContext {
    /// LLM client for completions.
    pub llm: Box<dyn LlmClient>,
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

/// Cassette being recorded; write it with [`RecordingSession::finish`].
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl ServiceContext {
    /// Live Anthropic client from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingCredentials`] without an API key.
    pub fn live() -> Result<Self, GenerationError> {
        Ok(Self { llm: Box::new(LiveLlmClient::from_env()?), recorder: None })
    }

    /// Live client whose interactions are recorded to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingCredentials`] without an API key.
    pub fn recording(path: &Path) -> Result<Self, GenerationError> {
        let live = LiveLlmClient::from_env()?;
        let recorder =
            Arc::new(Mutex::new(CassetteRecorder::new(path, cassette_name(path), RECORDER_COMMIT)));
        Ok(Self {
            llm: Box::new(RecordingLlmClient::new(Box::new(live), Arc::clone(&recorder))),
            recorder: Some(recorder),
        })
    }

    /// Client serving completions from the cassette at `path`. Needs no credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, CodedocError> {
        let cassette = Cassette::load(path)?;
        Ok(Self {
            llm: Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
            recorder: None,
        })
    }

    /// Splits off the recording session, if any.
    #[must_use]
    pub fn into_parts(self) -> (Box<dyn LlmClient>, Option<RecordingSession>) {
        (self.llm, self.recorder.map(|recorder| RecordingSession { recorder }))
    }
}

impl RecordingSession {
    /// Writes the cassette. Every client sharing the recorder must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorder is still shared or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, CodedocError> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| CodedocError::Serialization("cassette recorder still in use".into()))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let path = recorder.path().to_path_buf();
        recorder.finish().map_err(|source| CodedocError::Io { path, source })
    }
}

fn cassette_name(path: &Path) -> String {
    path.file_stem().map_or_else(|| "codedoc".to_string(), |s| s.to_string_lossy().into_owned())
}
