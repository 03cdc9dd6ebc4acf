//! Writes generation calls from a recording run into a cassette file.
//!
//! Prompts carry source excerpts, so string inputs pass through secret
//! redaction before they are kept. Outputs are stored as returned; replay
//! only reads outputs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::format::{Cassette, Interaction};
use crate::budget::redact_secrets;

/// Collects generation calls and writes them as a YAML cassette.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Creates a recorder that will write to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self { path: path.into(), name: name.into(), commit: commit.into(), interactions: Vec::new() }
    }

    /// Appends a call in arrival order. Strings inside `input` are redacted.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: Value,
        output: Value,
    ) {
        let seq = u64::try_from(self.interactions.len()).unwrap_or(u64::MAX);
        self.interactions.push(Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input: redact_value(input),
            output,
        });
    }

    /// Destination of the cassette file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Prompt and completion tokens reported by successful calls.
    #[must_use]
    pub fn token_totals(&self) -> (u64, u64) {
        self.interactions.iter().fold((0, 0), |(prompt, completion), interaction| {
            let usage = &interaction.output["Ok"];
            (
                prompt + usage["prompt_tokens"].as_u64().unwrap_or(0),
                completion + usage["completion_tokens"].as_u64().unwrap_or(0),
            )
        })
    }

    /// Writes the cassette to a sibling temp file, then renames it into place.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the file, or the rename fails.
    pub fn finish(self) -> Result<PathBuf, io::Error> {
        let (prompt_tokens, completion_tokens) = self.token_totals();
        let calls = self.interactions.len();
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            commit: self.commit,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("yaml.tmp");
        fs::write(&staging, yaml)?;
        fs::rename(&staging, &self.path)?;
        info!(
            path = %self.path.display(),
            calls,
            prompt_tokens,
            completion_tokens,
            "cassette written"
        );
        Ok(self.path)
    }
}

fn redact_value(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_secrets(&text)),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_value).collect()),
        Value::Object(fields) => {
            Value::Object(fields.into_iter().map(|(key, field)| (key, redact_value(field))).collect())
        }
        other => other,
    }
}
