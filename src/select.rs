//! Selector: picks the key modules and top files worth summarizing.

use std::collections::HashMap;

use crate::scan::{FileRecord, ScanSet};

/// Maximum number of key modules.
pub const MAX_KEY_MODULES: usize = 10;
/// A directory needs at least this many direct files to be a key module.
pub const MIN_MODULE_FILES: usize = 3;
/// Deepest directory (counted in `/` separators) considered a module.
pub const MAX_MODULE_DEPTH: usize = 2;
/// Maximum number of top files.
pub const MAX_TOP_FILES: usize = 10;

/// Basenames that always go first in the top-file list.
pub const PRIORITY_FILE_NAMES: &[&str] = &[
    "main.go",
    "main.py",
    "app.py",
    "index.js",
    "index.ts",
    "server.js",
    "main.rs",
    "Makefile",
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "go.mod",
    "Cargo.toml",
];

/// Returns shallow directories holding at least [`MIN_MODULE_FILES`] files.
///
/// Order is first discovery in traversal order; the list is capped at
/// [`MAX_KEY_MODULES`]. Files directly in the root never form a module.
#[must_use]
pub fn key_modules(scan: &ScanSet) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for file in &scan.files {
        let Some(dir) = file.parent_dir() else {
            continue;
        };
        let count = counts.entry(dir).or_insert(0);
        if *count == 0 {
            order.push(dir);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|dir| dir.matches('/').count() <= MAX_MODULE_DEPTH)
        .filter(|dir| counts[dir] >= MIN_MODULE_FILES)
        .take(MAX_KEY_MODULES)
        .map(str::to_string)
        .collect()
}

/// Returns the files to summarize individually.
///
/// Priority files come first in traversal order; other non-test files fill
/// the remaining slots. The non-priority tail is what gets truncated.
#[must_use]
pub fn top_files(scan: &ScanSet) -> Vec<&FileRecord> {
    let (priority, regular): (Vec<&FileRecord>, Vec<&FileRecord>) = scan
        .files
        .iter()
        .filter(|f| !f.is_test)
        .partition(|f| PRIORITY_FILE_NAMES.contains(&f.file_name()));

    priority.into_iter().chain(regular).take(MAX_TOP_FILES).collect()
}
