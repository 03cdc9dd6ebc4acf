//! Output record handed to the external report renderer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::DetectionFacts;
use crate::error::CodedocError;
use crate::orchestrate::RunReport;
use crate::scan::{Language, LanguageStat, ScanSet};

/// Everything a renderer needs, serialized as pretty JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// When the record was produced.
    pub generated_at: DateTime<Utc>,
    /// Repository name.
    pub repo_name: String,
    /// Canonical scan root.
    pub root: PathBuf,
    /// Files scanned.
    pub total_files: usize,
    /// Lines scanned.
    pub total_lines: usize,
    /// Per-language totals.
    pub language_stats: BTreeMap<Language, LanguageStat>,
    /// Whether the walker hit its file cap.
    pub reached_max_files: bool,
    /// Detector output.
    pub detection: DetectionFacts,
    /// Generated summaries.
    #[serde(flatten)]
    pub report: RunReport,
}

impl OutputRecord {
    /// Assembles a record from one run's pieces.
    #[must_use]
    pub fn new(scan: &ScanSet, detection: DetectionFacts, report: RunReport) -> Self {
        Self {
            generated_at: Utc::now(),
            repo_name: scan.repo_name.clone(),
            root: scan.root.clone(),
            total_files: scan.total_files(),
            total_lines: scan.total_lines,
            language_stats: scan.language_stats.clone(),
            reached_max_files: scan.reached_max_files,
            detection,
            report,
        }
    }

    /// Writes the record to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, path: &Path) -> Result<(), CodedocError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CodedocError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| CodedocError::Io { path: parent.to_path_buf(), source })?;
        }
        fs::write(path, json).map_err(|source| CodedocError::Io { path: path.to_path_buf(), source })
    }
}
