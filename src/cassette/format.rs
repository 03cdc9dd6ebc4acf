//! Cassette data structures.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodedocError;

/// A single recorded interaction with a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned by the recorder).
    pub seq: u64,
    /// Port name, e.g. `"llm"`.
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Input sent to the port.
    pub input: serde_json::Value,
    /// Output returned, in the `{"Ok": v}` / `{"Err": msg}` form.
    pub output: serde_json::Value,
}

/// A named, ordered sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Free-form revision marker of the scanned tree at recording time.
    pub commit: String,
    /// Interactions in recording order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Loads a YAML cassette from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CodedocError::Io`] if the file cannot be read and
    /// [`CodedocError::Serialization`] if it is not a valid cassette.
    pub fn load(path: &Path) -> Result<Self, CodedocError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| CodedocError::Io { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&content).map_err(|e| {
            CodedocError::Serialization(format!("cassette {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_reads_yaml_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.cassette.yaml");
        let yaml = r#"name: fixture
recorded_at: 2024-06-15T10:30:00Z
commit: abc
interactions:
  - seq: 0
    port: llm
    method: complete
    input: {}
    output:
      Ok: {text: hi, prompt_tokens: 1, completion_tokens: 1}
"#;
        std::fs::write(&path, yaml).unwrap();

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.name, "fixture");
        assert_eq!(
            cassette.interactions[0].output,
            json!({"Ok": {"text": "hi", "prompt_tokens": 1, "completion_tokens": 1}})
        );
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "- not: a cassette").unwrap();
        assert!(matches!(Cassette::load(&path), Err(CodedocError::Serialization(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Cassette::load(&dir.path().join("absent.yaml")),
            Err(CodedocError::Io { .. })
        ));
    }
}
