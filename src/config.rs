//! Run configuration: defaults, optional YAML file, validation.
//!
//! Precedence, lowest first: built-in defaults, `<root>/.codedoc.yaml` (or an
//! explicit file), command-line flags, environment. This module owns the
//! first two layers and validation; flags and environment are applied by
//! the `generate` command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generate::LlmSettings;
use crate::orchestrate::ContextBudget;
use crate::scan::{IgnoreRules, LanguageFilter, ScanOptions, CACHE_DIR_NAME};

/// Config file looked up under the scan root.
pub const CONFIG_FILE_NAME: &str = ".codedoc.yaml";

/// Languages scanned when nothing else is configured.
pub const DEFAULT_LANGUAGES: &[&str] =
    &["go", "python", "typescript", "javascript", "markdown", "yaml", "dockerfile"];

/// Every knob of a `generate` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateOptions {
    /// Directory to scan. Never read from the file.
    #[serde(skip)]
    pub root: PathBuf,
    /// Maximum files kept by the walker.
    pub max_files: usize,
    /// Maximum excerpt lines per file.
    pub max_lines_per_file: usize,
    /// Keep test files.
    pub include_tests: bool,
    /// Language filter; empty means every language.
    pub languages: Vec<String>,
    /// Mask credential-like strings in file excerpts.
    pub redact_secrets: bool,
    /// Ignore cached results (still writes fresh ones).
    pub force: bool,
    /// Use placeholders instead of calling the generation service.
    pub dry_run: bool,
    /// Upper bound on outbound calls per second.
    pub max_requests_per_second: f64,
    /// Cache root; relative paths are resolved against `root`.
    pub cache_dir: Option<PathBuf>,
    /// Model identifier.
    pub model: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Where the output record is written.
    pub output: PathBuf,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        let llm = LlmSettings::default();
        Self {
            root: PathBuf::from("."),
            max_files: 200,
            max_lines_per_file: 1000,
            include_tests: false,
            languages: DEFAULT_LANGUAGES.iter().map(|s| (*s).to_string()).collect(),
            redact_secrets: true,
            force: false,
            dry_run: false,
            max_requests_per_second: 2.0,
            cache_dir: None,
            model: llm.model,
            max_tokens: llm.max_tokens,
            output: PathBuf::from("codedoc-report.json"),
        }
    }
}

impl GenerateOptions {
    /// Defaults for `root`.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    /// Defaults overlaid with a YAML file.
    ///
    /// With `explicit`, that file must exist. Otherwise `<root>/.codedoc.yaml`
    /// is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::File`] if the file cannot be read or parsed.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Self::for_root(root));
                }
                candidate
            }
        };
        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::File { path: path.clone(), reason: e.to_string() })?;
        let mut options: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::File { path: path.clone(), reason: e.to_string() })?
        };
        options.root = root.to_path_buf();
        Ok(options)
    }

    /// Checks the options before anything touches the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::InvalidRoot(self.root.clone()));
        }
        if self.max_files == 0 {
            return Err(ConfigError::NonPositiveBudget("max_files"));
        }
        if self.max_lines_per_file == 0 {
            return Err(ConfigError::NonPositiveBudget("max_lines_per_file"));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::NonPositiveBudget("max_tokens"));
        }
        let rate = self.max_requests_per_second;
        if !rate.is_finite() || rate <= 0.0 || Duration::try_from_secs_f64(1.0 / rate).is_err() {
            return Err(ConfigError::InvalidRate(rate));
        }
        Ok(())
    }

    /// Absolute cache root.
    #[must_use]
    pub fn cache_root(&self) -> PathBuf {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let dir = match &self.cache_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join(CACHE_DIR_NAME),
        };
        dir.canonicalize().unwrap_or(dir)
    }

    /// Walker options, with the cache root excluded from the scan.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_files: self.max_files,
            include_tests: self.include_tests,
            languages: LanguageFilter::new(&self.languages),
            ignore: IgnoreRules::new(vec![self.cache_root()]),
        }
    }

    /// Per-file excerpt budget.
    #[must_use]
    pub fn context_budget(&self) -> ContextBudget {
        ContextBudget {
            max_lines_per_file: self.max_lines_per_file,
            redact_secrets: self.redact_secrets,
        }
    }

    /// Model settings for the live generator.
    #[must_use]
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings { model: self.model.clone(), max_tokens: self.max_tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let options = GenerateOptions::default();
        assert_eq!(options.max_files, 200);
        assert_eq!(options.max_lines_per_file, 1000);
        assert!(options.redact_secrets);
        assert!((options.max_requests_per_second - 2.0).abs() < f64::EPSILON);
        assert_eq!(options.languages.len(), DEFAULT_LANGUAGES.len());
    }

    #[test]
    fn root_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "max_files: 5\nlanguages: [rs]\n").unwrap();

        let options = GenerateOptions::load(dir.path(), None).unwrap();

        assert_eq!(options.max_files, 5);
        assert_eq!(options.languages, vec!["rs"]);
        assert_eq!(options.max_lines_per_file, 1000);
        assert_eq!(options.root, dir.path());
    }

    #[test]
    fn missing_root_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let options = GenerateOptions::load(dir.path(), None).unwrap();
        assert_eq!(options, GenerateOptions::for_root(dir.path()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "max_filez: 5\n").unwrap();
        assert!(matches!(
            GenerateOptions::load(dir.path(), Some(&path)),
            Err(ConfigError::File { .. })
        ));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(GenerateOptions::load(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn validation_rejects_bad_budgets() {
        let dir = tempfile::tempdir().unwrap();
        let base = GenerateOptions::for_root(dir.path());
        assert!(base.validate().is_ok());

        let zero_files = GenerateOptions { max_files: 0, ..base.clone() };
        assert!(matches!(zero_files.validate(), Err(ConfigError::NonPositiveBudget("max_files"))));

        let zero_lines = GenerateOptions { max_lines_per_file: 0, ..base.clone() };
        assert!(zero_lines.validate().is_err());

        let bad_rate = GenerateOptions { max_requests_per_second: f64::NAN, ..base.clone() };
        assert!(matches!(bad_rate.validate(), Err(ConfigError::InvalidRate(_))));

        let tiny_rate = GenerateOptions { max_requests_per_second: 1e-20, ..base.clone() };
        assert!(matches!(tiny_rate.validate(), Err(ConfigError::InvalidRate(_))));

        let no_root = GenerateOptions { root: dir.path().join("missing"), ..base };
        assert!(matches!(no_root.validate(), Err(ConfigError::InvalidRoot(_))));
    }

    #[test]
    fn relative_cache_dir_resolves_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let options =
            GenerateOptions { cache_dir: Some("cache".into()), ..GenerateOptions::for_root(dir.path()) };
        assert_eq!(options.cache_root(), dir.path().canonicalize().unwrap().join("cache"));
    }
}
