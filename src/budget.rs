//! Context budgeter: bounded, deterministic excerpts of a single file.
//!
//! Small files pass through untouched. Larger files keep a header (up to the
//! first declaration, at most [`HEADER_LOOKAHEAD`] lines) and then a
//! fixed-stride sample of the rest. The sample is lossy but reproducible:
//! the same content and cap always give the same slice.

use std::fs;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::scan::{FileRecord, Language};

/// Maximum number of lines copied before sampling starts.
pub const HEADER_LOOKAHEAD: usize = 50;

/// Replacement for anything that looks like a credential.
pub const REDACTION_MASK: &str = "[REDACTED]";

/// Credential patterns. Vendor prefixes come first so their tokens are
/// masked whole.
const SECRET_PATTERN_SOURCES: &[&str] = &[
    r"sk-[A-Za-z0-9_\-]{20,}",
    r"ghp_[A-Za-z0-9]{36}",
    r"github_pat_[A-Za-z0-9_]{22,}",
    r"AKIA[0-9A-Z]{16}",
    r"xox[baprs]-[A-Za-z0-9\-]{10,}",
    r#"(?i)(api[_\-]?key|api[_\-]?secret|access[_\-]?token|auth[_\-]?token|private[_\-]?key|client[_\-]?secret|secret[_\-]?key)[ \t]*[:=][ \t]*["']?[\w\-./+]+["']?"#,
    r#"(?i)(password|passwd|pwd)[ \t]*[:=][ \t]*["']?[^\s"']+["']?"#,
    r"\b[A-Za-z0-9]{40,}\b",
];

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SECRET_PATTERN_SOURCES
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!("redaction: bad pattern {pattern}: {err}");
                None
            }
        })
        .collect()
});

/// Bounded excerpt of one file plus its metadata header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSlice {
    /// Path below the scan root.
    pub path: String,
    /// Language tag.
    pub language: Language,
    /// Line count of the whole file.
    pub total_lines: usize,
    /// File size in bytes.
    pub size: u64,
    /// Excerpt lines, never more than the configured cap.
    pub lines: Vec<String>,
}

impl ContextSlice {
    /// Reads `record` from disk and budgets it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file vanished or became unreadable.
    pub fn read(record: &FileRecord, max_lines: usize, redact: bool) -> std::io::Result<Self> {
        let bytes = fs::read(&record.path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(Self::from_content(record, &content, max_lines, redact))
    }

    /// Budgets already-loaded content for `record`.
    #[must_use]
    pub fn from_content(record: &FileRecord, content: &str, max_lines: usize, redact: bool) -> Self {
        let mut lines: Vec<String> =
            extract(content, max_lines, record.language).into_iter().map(str::to_string).collect();
        if redact {
            for line in &mut lines {
                *line = redact_secrets(line);
            }
        }
        Self {
            path: record.relative_path.clone(),
            language: record.language,
            total_lines: record.lines,
            size: record.size,
            lines,
        }
    }

    /// Renders the slice as the text handed to the generator.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "File: {}\nLanguage: {}\nTotal lines: {}\nSize: {} bytes\n\nContent sample:\n{}",
            self.path,
            self.language,
            self.total_lines,
            self.size,
            self.lines.join("\n")
        )
    }
}

/// Returns at most `max_lines` lines of `content`.
///
/// Content within the cap is returned unchanged. Otherwise the header runs
/// until the first line holding a declaration marker for `language` (that
/// line included) or the look-ahead limit, and the remaining budget is
/// filled with every `stride`-th line after the header, where
/// `stride = max(1, (total - header) / remaining)`.
#[must_use]
pub fn extract(content: &str, max_lines: usize, language: Language) -> Vec<&str> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() <= max_lines {
        return lines;
    }

    let markers = language.declaration_markers();
    let lookahead = HEADER_LOOKAHEAD.min(max_lines);
    let mut result = Vec::with_capacity(max_lines);
    for line in lines.iter().take(lookahead) {
        result.push(*line);
        if markers.iter().any(|m| line.contains(m)) {
            break;
        }
    }

    let header = result.len();
    let remaining = max_lines - header;
    if remaining > 0 {
        let stride = ((lines.len() - header) / remaining).max(1);
        result.extend(lines[header..].iter().step_by(stride).take(remaining));
    }
    result
}

/// Masks credential-like substrings without touching line structure.
#[must_use]
pub fn redact_secrets(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, REDACTION_MASK).into_owned())
}
