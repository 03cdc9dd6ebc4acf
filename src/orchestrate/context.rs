//! Context texts handed to the generator, one builder per stage.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::detect::DetectionFacts;
use crate::scan::{FileRecord, ScanSet};

/// Deepest directory (in `/` separators) listed in the histogram.
pub const HISTOGRAM_MAX_DEPTH: usize = 2;
/// Directories need at least this many files to be listed.
pub const HISTOGRAM_MIN_FILES: usize = 2;
/// Maximum histogram entries.
pub const HISTOGRAM_MAX_ENTRIES: usize = 10;
/// Maximum sample files listed per module.
pub const MODULE_SAMPLE_FILES: usize = 10;
/// Maximum scripts listed per build tool in the quickstart context.
pub const QUICKSTART_SCRIPTS: usize = 3;

/// Repository overview: totals, languages, detection facts and directories.
#[must_use]
pub fn architecture(scan: &ScanSet, facts: &DetectionFacts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository: {}", scan.repo_name);
    let _ = writeln!(out, "Total files: {}", scan.total_files());
    let _ = writeln!(out, "Total lines: {}", scan.total_lines);

    out.push_str("\nLanguages:\n");
    for (lang, stat) in &scan.language_stats {
        let _ = writeln!(
            out,
            "- {lang}: {:.1}% ({} files, {} lines)",
            stat.percentage, stat.file_count, stat.lines
        );
    }

    if !facts.frameworks.is_empty() {
        out.push_str("\nFrameworks detected:\n");
        for fw in &facts.frameworks {
            let _ = writeln!(out, "- {} ({})", fw.name, fw.language);
        }
    }
    if !facts.build_tools.is_empty() {
        out.push_str("\nBuild tools:\n");
        for tool in &facts.build_tools {
            let _ = writeln!(out, "- {} ({})", tool.kind, tool.file);
        }
    }
    if !facts.entrypoints.is_empty() {
        out.push_str("\nEntrypoints:\n");
        for ep in &facts.entrypoints {
            let _ = writeln!(out, "- {}: {}", ep.kind, ep.path);
        }
    }

    out.push_str("\nKey directories:\n");
    for (dir, count) in directory_histogram(&scan.files) {
        let _ = writeln!(out, "- /{dir} ({count} files)");
    }
    out.trim_end().to_string()
}

/// Counts every ancestor directory of every file and keeps the shallow,
/// populated ones in first-seen order.
#[must_use]
pub fn directory_histogram(files: &[FileRecord]) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in files {
        let Some(dir) = file.parent_dir() else {
            continue;
        };
        let mut end = 0;
        for segment in dir.split('/') {
            end += segment.len();
            let ancestor = &dir[..end];
            end += 1;
            match counts.get_mut(ancestor) {
                Some(n) => *n += 1,
                None => {
                    counts.insert(ancestor.to_string(), 1);
                    order.push(ancestor.to_string());
                }
            }
        }
    }

    order
        .into_iter()
        .filter(|dir| dir.matches('/').count() <= HISTOGRAM_MAX_DEPTH)
        .filter_map(|dir| {
            let count = counts[&dir];
            (count >= HISTOGRAM_MIN_FILES).then_some((dir, count))
        })
        .take(HISTOGRAM_MAX_ENTRIES)
        .collect()
}

/// One module: size, language mix and a few file names.
#[must_use]
pub fn module(scan: &ScanSet, module: &str) -> String {
    let prefix = format!("{module}/");
    let members: Vec<&FileRecord> =
        scan.files.iter().filter(|f| f.relative_path.starts_with(&prefix)).collect();

    let mut languages: BTreeMap<&str, usize> = BTreeMap::new();
    for file in &members {
        *languages.entry(file.language.as_str()).or_default() += 1;
    }
    let lines: usize = members.iter().map(|f| f.lines).sum();

    let mut out = String::new();
    let _ = writeln!(out, "Module: {module}");
    let _ = writeln!(out, "Files: {}", members.len());
    let _ = writeln!(out, "Lines: {lines}");
    out.push_str("Languages:\n");
    for (lang, count) in languages {
        let _ = writeln!(out, "- {lang}: {count} files");
    }
    out.push_str("\nKey files:\n");
    for file in members.iter().take(MODULE_SAMPLE_FILES) {
        let _ = writeln!(out, "- {} ({} lines)", file.file_name(), file.lines);
    }
    out.trim_end().to_string()
}

/// Build tooling and entrypoints for the quickstart stage.
#[must_use]
pub fn quickstart(scan: &ScanSet, facts: &DetectionFacts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project: {}", scan.repo_name);
    if !facts.build_tools.is_empty() {
        out.push_str("\nBuild tools found:\n");
        for tool in &facts.build_tools {
            let _ = writeln!(out, "- {}: {}", tool.kind, tool.file);
            if !tool.scripts.is_empty() {
                let shown: Vec<&str> =
                    tool.scripts.iter().take(QUICKSTART_SCRIPTS).map(String::as_str).collect();
                let _ = writeln!(out, "  Scripts: {}", shown.join(", "));
            }
        }
    }
    if !facts.entrypoints.is_empty() {
        out.push_str("\nEntrypoints:\n");
        for ep in &facts.entrypoints {
            let _ = writeln!(out, "- {}: {}", ep.description, ep.command);
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BuildTool;
    use crate::scan::{Language, LanguageStat};

    fn record(relative: &str, lines: usize) -> FileRecord {
        FileRecord {
            path: format!("/repo/{relative}").into(),
            relative_path: relative.to_string(),
            size: 1,
            lines,
            language: Language::detect(relative.rsplit('/').next().unwrap()),
            is_test: false,
            hash: String::new(),
        }
    }

    #[test]
    fn histogram_counts_ancestors_and_filters_depth() {
        let files = vec![
            record("src/a.go", 1),
            record("src/api/b.go", 1),
            record("src/api/c.go", 1),
            record("a/b/c/d.go", 1),
            record("a/b/c/e.go", 1),
            record("lonely/x.go", 1),
            record("top.go", 1),
        ];
        let hist = directory_histogram(&files);
        assert_eq!(
            hist,
            vec![
                ("src".to_string(), 3),
                ("src/api".to_string(), 2),
                ("a".to_string(), 2),
                ("a/b".to_string(), 2),
                ("a/b/c".to_string(), 2),
            ]
        );
    }

    #[test]
    fn module_context_lists_members_only() {
        let scan = ScanSet {
            files: vec![
                record("api/handler.go", 10),
                record("api/routes.py", 5),
                record("apiary/other.go", 99),
            ],
            ..ScanSet::default()
        };
        let text = module(&scan, "api");
        assert!(text.starts_with("Module: api\nFiles: 2\nLines: 15\nLanguages:\n- go: 1 files\n- python: 1 files"));
        assert!(text.contains("- handler.go (10 lines)"));
        assert!(!text.contains("other.go"));
    }

    #[test]
    fn architecture_context_has_totals_and_languages() {
        let mut scan = ScanSet {
            repo_name: "demo".into(),
            files: vec![record("main.go", 4)],
            total_lines: 4,
            ..ScanSet::default()
        };
        scan.language_stats
            .insert(Language::Go, LanguageStat { file_count: 1, lines: 4, percentage: 100.0 });
        let facts = DetectionFacts {
            build_tools: vec![BuildTool { kind: "go".into(), file: "go.mod".into(), scripts: vec![] }],
            ..DetectionFacts::default()
        };
        let text = architecture(&scan, &facts);
        assert!(text.starts_with("Repository: demo\nTotal files: 1\nTotal lines: 4\n"));
        assert!(text.contains("- go: 100.0% (1 files, 4 lines)"));
        assert!(text.contains("Build tools:\n- go (go.mod)"));
        assert!(text.ends_with("Key directories:"));
    }

    #[test]
    fn quickstart_context_caps_scripts() {
        let facts = DetectionFacts {
            build_tools: vec![BuildTool {
                kind: "npm".into(),
                file: "package.json".into(),
                scripts: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            }],
            ..DetectionFacts::default()
        };
        let text = quickstart(&ScanSet { repo_name: "x".into(), ..ScanSet::default() }, &facts);
        assert!(text.contains("  Scripts: a, b, c"));
        assert!(!text.contains(", d"));
    }
}
