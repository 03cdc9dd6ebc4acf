//! One full run: validate, build the generator, scan, detect, summarize.

use tracing::info;

use crate::cache::Cache;
use crate::cancel::CancelToken;
use crate::config::GenerateOptions;
use crate::detect::Detector;
use crate::error::Result;
use crate::generate::{Generator, LlmGenerator, PlaceholderGenerator};
use crate::orchestrate::Orchestrator;
use crate::output::OutputRecord;
use crate::ports::LlmClient;
use crate::ratelimit::RateLimiter;
use crate::scan;

/// Which generator variant a run uses. Picked once, before the run starts.
pub enum GeneratorMode {
    /// Fixed placeholders; no network and no cache writes.
    Placeholder,
    /// Cached, rate-limited calls through this client.
    Llm(Box<dyn LlmClient>),
}

/// Runs the whole pipeline and returns the output record.
///
/// Cancellation yields a partial record, not an error.
///
/// # Errors
///
/// Returns a configuration error before anything is scanned, a generator
/// construction error before any stage runs, or a scan error when the root
/// cannot be read.
pub fn run(
    options: &GenerateOptions,
    mode: GeneratorMode,
    detector: &dyn Detector,
    cancel: &CancelToken,
) -> Result<OutputRecord> {
    options.validate()?;

    let generator: Box<dyn Generator> = match mode {
        GeneratorMode::Placeholder => Box::new(PlaceholderGenerator),
        GeneratorMode::Llm(client) => {
            let cache = Cache::new(options.cache_root(), options.force);
            Box::new(LlmGenerator::new(client, cache, options.llm_settings())?)
        }
    };

    let scan_set = scan::scan(&options.root, &options.scan_options(), cancel)?;
    let facts = detector.detect(&scan_set);
    info!(
        entrypoints = facts.entrypoints.len(),
        build_tools = facts.build_tools.len(),
        "detection done"
    );

    let limiter = RateLimiter::new(options.max_requests_per_second);
    let mut orchestrator = Orchestrator::new(generator, limiter, options.context_budget());
    let report = orchestrator.run(&scan_set, &facts, cancel);

    Ok(OutputRecord::new(&scan_set, facts, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ManifestDetector;
    use crate::error::{CodedocError, ConfigError};
    use std::fs;

    #[test]
    fn invalid_budget_fails_before_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let options = GenerateOptions { max_files: 0, ..GenerateOptions::for_root(dir.path()) };
        let err = run(&options, GeneratorMode::Placeholder, &ManifestDetector, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, CodedocError::Config(ConfigError::NonPositiveBudget("max_files"))));
    }

    #[test]
    fn placeholder_run_leaves_no_cache_behind() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        fs::write(dir.path().join("go.mod"), "module demo\n").unwrap();
        let options = GenerateOptions::for_root(dir.path());

        let record =
            run(&options, GeneratorMode::Placeholder, &ManifestDetector, &CancelToken::new()).unwrap();

        assert_eq!(record.total_files, 2);
        assert_eq!(record.report.architecture, "[architecture summary placeholder - dry run mode]");
        assert_eq!(record.detection.build_tools[0].kind, "go");
        assert!(!options.cache_root().exists());
    }
}
