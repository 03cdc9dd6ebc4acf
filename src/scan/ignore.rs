//! Ignore rules applied while walking the tree.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Name of the cache directory created under the scan root.
pub const CACHE_DIR_NAME: &str = ".codedoc-cache";

/// Patterns matched against every path segment and every file name.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    "vendor",
    "node_modules",
    "dist",
    "build",
    "target",
    "__pycache__",
    CACHE_DIR_NAME,
    "*.min.js",
    "*.min.css",
];

/// Compiled ignore rules for one scan.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    segments: GlobSet,
    extra_dirs: Vec<PathBuf>,
}

impl IgnoreRules {
    /// Builds the default rule set plus any extra absolute directories
    /// (the configured cache root when it is not the default one).
    #[must_use]
    pub fn new(extra_dirs: Vec<PathBuf>) -> Self {
        Self { segments: build_globset(DEFAULT_IGNORE_PATTERNS), extra_dirs }
    }

    /// Returns `true` if the directory at `path` must not be descended into.
    ///
    /// `relative` is the path below the scan root; any of its segments
    /// matching a pattern prunes the whole subtree.
    #[must_use]
    pub fn is_ignored_dir(&self, path: &Path, relative: &Path) -> bool {
        if self.extra_dirs.iter().any(|dir| dir == path) {
            return true;
        }
        relative.components().any(|component| match component {
            Component::Normal(segment) => self.segments.is_match(Path::new(segment)),
            _ => false,
        })
    }

    /// Returns `true` if a file name matches an ignore pattern.
    #[must_use]
    pub fn is_ignored_file(&self, file_name: &str) -> bool {
        self.segments.is_match(file_name)
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn build_globset(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!("ignore: bad pattern {pattern}: {err}"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!("ignore: failed to compile patterns: {err}");
        GlobSet::empty()
    })
}
