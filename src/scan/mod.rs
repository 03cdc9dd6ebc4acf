//! Walker: traverses a source tree and builds the [`ScanSet`].
//!
//! Traversal is depth-first in file-name order. Ignored directories are
//! pruned before descent, so they never count against the file budget.
//! Per-file read failures drop the file silently; only an unreadable root
//! is an error.

pub mod ignore;
pub mod language;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::ScanError;

pub use ignore::{IgnoreRules, CACHE_DIR_NAME};
pub use language::{Language, LanguageFilter};

/// Files larger than this are skipped.
pub const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// One scanned file. Built once by the walker and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path below the scan root, `/`-separated.
    pub relative_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Line count (`0` for an empty file, otherwise newlines + 1).
    pub lines: usize,
    /// Language tag.
    pub language: Language,
    /// Whether the file looks like a test.
    pub is_test: bool,
    /// Identity hash over (relative path, size, modification time).
    pub hash: String,
}

impl FileRecord {
    /// Basename of the file.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.relative_path.rsplit('/').next().unwrap_or(&self.relative_path)
    }

    /// Parent directory below the root, or `None` for top-level files.
    #[must_use]
    pub fn parent_dir(&self) -> Option<&str> {
        self.relative_path.rsplit_once('/').map(|(dir, _)| dir)
    }
}

/// Per-language totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    /// Number of files.
    pub file_count: usize,
    /// Number of lines.
    pub lines: usize,
    /// Share of all scanned lines, `0.0..=100.0`.
    pub percentage: f64,
}

/// Output of one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSet {
    /// Repository name (basename of the root).
    pub repo_name: String,
    /// Canonical scan root.
    pub root: PathBuf,
    /// Files in traversal order.
    pub files: Vec<FileRecord>,
    /// Sum of all file line counts.
    pub total_lines: usize,
    /// Per-language totals.
    pub language_stats: BTreeMap<Language, LanguageStat>,
    /// `true` when the walk stopped because the file cap was reached.
    pub reached_max_files: bool,
    /// `true` when the walk was cancelled before it finished.
    pub cancelled: bool,
}

impl ScanSet {
    /// Number of files collected.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    fn push(&mut self, record: FileRecord) {
        let stat = self.language_stats.entry(record.language).or_default();
        stat.file_count += 1;
        stat.lines += record.lines;
        self.total_lines += record.lines;
        self.files.push(record);
    }

    /// Percentages are only computed once the whole set is known.
    fn finalize_percentages(&mut self) {
        if self.total_lines == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = self.total_lines as f64;
        for stat in self.language_stats.values_mut() {
            #[allow(clippy::cast_precision_loss)]
            let lines = stat.lines as f64;
            stat.percentage = lines / total * 100.0;
        }
    }
}

/// Walker options.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Stop once this many files have been collected.
    pub max_files: usize,
    /// Keep test files.
    pub include_tests: bool,
    /// Restrict to these languages.
    pub languages: LanguageFilter,
    /// Ignore rules, including the cache root.
    pub ignore: IgnoreRules,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_files: 200,
            include_tests: false,
            languages: LanguageFilter::default(),
            ignore: IgnoreRules::default(),
        }
    }
}

#[derive(Debug, Default)]
struct SkipCounters {
    ignored: usize,
    too_big: usize,
    unreadable: usize,
    filtered: usize,
    tests: usize,
}

/// Scans `root` and returns the collected files.
///
/// Reaching `max_files` or observing cancellation ends the walk normally
/// with whatever was collected.
///
/// # Errors
///
/// Returns [`ScanError::UnreadableRoot`] if `root` is missing, not a
/// directory, or cannot be listed.
pub fn scan(root: &Path, opts: &ScanOptions, cancel: &CancelToken) -> Result<ScanSet, ScanError> {
    let root = root.canonicalize().map_err(|e| ScanError::UnreadableRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !root.is_dir() {
        return Err(ScanError::UnreadableRoot {
            path: root,
            reason: "not a directory".to_string(),
        });
    }
    fs::read_dir(&root).map_err(|e| ScanError::UnreadableRoot {
        path: root.clone(),
        reason: e.to_string(),
    })?;

    info!("scan: start -> {}", root.display());

    let mut set = ScanSet {
        repo_name: root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned()),
        root: root.clone(),
        ..ScanSet::default()
    };
    let mut skipped = SkipCounters::default();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            !opts.ignore.is_ignored_dir(entry.path(), relative)
        });

    for entry in walker {
        if cancel.is_cancelled() {
            info!("scan: cancelled after {} files", set.files.len());
            set.cancelled = true;
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("scan: skip unreadable entry: {err}");
                skipped.unreadable += 1;
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if opts.ignore.is_ignored_file(&file_name) {
            skipped.ignored += 1;
            continue;
        }

        // Follows symlinks; anything that is not a regular file is dropped.
        let meta = match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                skipped.ignored += 1;
                continue;
            }
            Err(err) => {
                debug!("scan: metadata failed for {}: {err}", entry.path().display());
                skipped.unreadable += 1;
                continue;
            }
        };
        if meta.len() > MAX_FILE_BYTES {
            debug!("scan: skip (size {} > max {MAX_FILE_BYTES}) {}", meta.len(), entry.path().display());
            skipped.too_big += 1;
            continue;
        }

        let relative = relative_path(&root, entry.path());
        let language = Language::detect(&file_name);
        if !opts.languages.allows(language) {
            skipped.filtered += 1;
            continue;
        }
        let is_test = is_test_file(&relative);
        if is_test && !opts.include_tests {
            skipped.tests += 1;
            continue;
        }

        let content = match fs::read(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                debug!("scan: read failed for {}: {err}", entry.path().display());
                skipped.unreadable += 1;
                continue;
            }
        };

        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();
        let hash = identity_hash(&relative, meta.len(), modified.as_secs(), modified.subsec_nanos());

        set.push(FileRecord {
            path: entry.path().to_path_buf(),
            relative_path: relative,
            size: meta.len(),
            lines: count_lines(&content),
            language,
            is_test,
            hash,
        });

        if set.files.len() >= opts.max_files {
            debug!("scan: reached max files ({})", opts.max_files);
            set.reached_max_files = true;
            break;
        }
    }

    set.finalize_percentages();

    info!(
        "scan: done, files={} lines={} (ignored={}, too_big={}, unreadable={}, filtered={}, tests={})",
        set.files.len(),
        set.total_lines,
        skipped.ignored,
        skipped.too_big,
        skipped.unreadable,
        skipped.filtered,
        skipped.tests
    );

    Ok(set)
}

/// Counts lines the way the budgeter splits them: `0` for empty content,
/// otherwise one more than the number of `\n` bytes.
#[must_use]
pub fn count_lines(content: &[u8]) -> usize {
    if content.is_empty() {
        return 0;
    }
    content.iter().filter(|&&b| b == b'\n').count() + 1
}

/// Deterministic identity of a file version, usable as a cache key.
#[must_use]
pub fn identity_hash(relative_path: &str, size: u64, mtime_secs: u64, mtime_nanos: u32) -> String {
    let mut h = Sha256::new();
    h.update(relative_path.as_bytes());
    h.update([0u8]);
    h.update(size.to_le_bytes());
    h.update(mtime_secs.to_le_bytes());
    h.update(mtime_nanos.to_le_bytes());
    format!("{:x}", h.finalize())
}

/// Returns `true` if the relative path looks like a test file.
#[must_use]
pub fn is_test_file(relative_path: &str) -> bool {
    let (dirs, name) = relative_path.rsplit_once('/').unwrap_or(("", relative_path));
    let name = name.to_ascii_lowercase();
    let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);

    let marked = name.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_tests")
        || stem.ends_with("_spec")
        || name.contains(".test.")
        || name.contains(".spec.");
    marked
        || dirs.split('/').any(|segment| matches!(segment, "test" | "tests" | "__tests__" | "spec"))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
