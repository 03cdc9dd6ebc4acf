//! Content-addressed store of generation results.
//!
//! One JSON file per key under the cache root. Last write wins; there is no
//! locking, so two runs against the same root at the same time are not
//! supported. Anything that fails to read or parse is reported as a miss.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::generate::{Constraints, SummaryKind};

/// Filesystem-safe cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

/// Fields hashed into a derived key. Serialized as JSON before hashing so
/// variable-length fields can never run into each other.
#[derive(Serialize)]
struct KeyMaterial<'a> {
    kind: SummaryKind,
    context_sha256: &'a str,
    max_words: Option<u32>,
    max_bullets: Option<u32>,
}

impl CacheKey {
    /// Uses a caller-supplied key (a file identity hash, possibly with a suffix).
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced with `_`.
    #[must_use]
    pub fn explicit(key: &str) -> Self {
        let safe = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect::<String>();
        Self(safe.trim_start_matches('.').to_string())
    }

    /// Derives a key from the summary kind, the full context text and the
    /// numeric constraints.
    #[must_use]
    pub fn derived(kind: SummaryKind, context: &str, constraints: Constraints) -> Self {
        let context_sha256 = sha_hex(context.as_bytes());
        let material = KeyMaterial {
            kind,
            context_sha256: &context_sha256,
            max_words: constraints.max_words,
            max_bullets: constraints.max_bullets,
        };
        // Serializing a struct of plain fields cannot fail.
        let encoded = serde_json::to_vec(&material).unwrap_or_default();
        Self(sha_hex(&encoded))
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the entry is stored under.
    pub key: String,
    /// Generated text.
    pub summary: String,
    /// `true` when this entry was served from disk rather than just produced.
    #[serde(default)]
    pub reused: bool,
    /// Approximate token count of the original call.
    #[serde(default)]
    pub token_estimate: usize,
}

/// On-disk cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
    force: bool,
}

impl Cache {
    /// Creates a cache under `root`. With `force`, every lookup misses but
    /// writes still happen.
    pub fn new(root: impl Into<PathBuf>, force: bool) -> Self {
        Self { root: root.into(), force }
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up `key`. Missing, unreadable and corrupt entries are all misses.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        if self.force {
            return None;
        }
        let path = self.entry_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("cache: unreadable entry {}: {err}", path.display());
                }
                debug!("cache: miss {}", key.as_str());
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&data) {
            Ok(mut entry) => {
                debug!("cache: hit {}", key.as_str());
                entry.reused = true;
                Some(entry)
            }
            Err(err) => {
                warn!("cache: corrupt entry {} treated as miss: {err}", path.display());
                None
            }
        }
    }

    /// Stores `entry` under `key`, creating the cache root on first use.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory or file cannot be written.
    pub fn put(&self, key: &CacheKey, entry: &CacheEntry) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let stored = CacheEntry { reused: false, ..entry.clone() };
        let data = serde_json::to_vec_pretty(&stored).map_err(io::Error::other)?;
        fs::write(self.entry_path(key), data)
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

fn sha_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}
