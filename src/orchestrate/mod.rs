//! Orchestrator: runs the four summarization stages in a fixed order.
//!
//! Architecture, then modules, then top files, then quickstart. Each stage
//! finishes before the next starts and no call is retried. A failed call
//! costs only its own unit of work. Cancellation is checked before every
//! call; once observed, the run stops and the report is marked partial.

pub mod context;
pub mod quickstart;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::budget::ContextSlice;
use crate::cancel::CancelToken;
use crate::detect::DetectionFacts;
use crate::error::GenerationError;
use crate::generate::{GenerationResult, Generator, SummaryKind, SummaryRequest};
use crate::ratelimit::RateLimiter;
use crate::scan::ScanSet;
use crate::select;

pub use quickstart::{fallback_steps, parse_bullets, MAX_BULLETS};

/// Suffix appended to a file's identity hash for its declaration listing.
pub const FUNCTIONS_KEY_SUFFIX: &str = "-functions";

/// Per-file budgets applied while building file contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Maximum excerpt lines per file.
    pub max_lines_per_file: usize,
    /// Mask credential-like strings before they leave the process.
    pub redact_secrets: bool,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self { max_lines_per_file: 1000, redact_secrets: true }
    }
}

/// Summary of one top file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Role summary.
    pub summary: String,
    /// Key declarations, one per bullet.
    pub bullets: Vec<String>,
    /// Whether the role summary came from the cache.
    pub cached: bool,
    /// Tokens spent on both calls.
    pub token_estimate: usize,
}

/// Call accounting for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Results produced by the generator rather than the cache.
    pub generated: usize,
    /// Results served from the cache.
    pub cache_hits: usize,
    /// Calls that failed.
    pub failures: usize,
    /// Sum of token estimates.
    pub token_estimate: usize,
}

/// Everything the renderer needs from the generation stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Repository overview.
    pub architecture: String,
    /// Module path to summary. Failed modules are absent.
    pub modules: BTreeMap<String, String>,
    /// File path to summary. Failed files are absent.
    pub files: BTreeMap<String, FileSummary>,
    /// Ordered quickstart steps.
    pub quickstart: Vec<String>,
    /// Set when the run stopped early.
    pub partial: bool,
    /// Call accounting.
    pub usage: Usage,
}

/// Text used when the architecture call fails.
#[must_use]
pub fn unavailable_text(kind: SummaryKind) -> String {
    format!("[{kind} summary unavailable]")
}

/// Drives one generation run.
///
/// Owns the generator picked at startup and the run's single rate limiter.
pub struct Orchestrator {
    generator: Box<dyn Generator>,
    limiter: RateLimiter,
    budget: ContextBudget,
}

/// Marker for an observed cancellation.
struct Cancelled;

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(generator: Box<dyn Generator>, limiter: RateLimiter, budget: ContextBudget) -> Self {
        Self { generator, limiter, budget }
    }

    /// Runs all stages over `scan`. Never fails: failures degrade the report.
    pub fn run(&mut self, scan: &ScanSet, facts: &DetectionFacts, cancel: &CancelToken) -> RunReport {
        let mut report = RunReport { partial: scan.cancelled, ..RunReport::default() };
        if self.run_stages(scan, facts, cancel, &mut report).is_err() {
            warn!("run cancelled; returning partial report");
            report.partial = true;
        }
        info!(
            generated = report.usage.generated,
            cache_hits = report.usage.cache_hits,
            failures = report.usage.failures,
            "generation finished"
        );
        report
    }

    fn run_stages(
        &mut self,
        scan: &ScanSet,
        facts: &DetectionFacts,
        cancel: &CancelToken,
        report: &mut RunReport,
    ) -> Result<(), Cancelled> {
        self.architecture_stage(scan, facts, cancel, report)?;
        self.module_stage(scan, cancel, report)?;
        self.file_stage(scan, cancel, report)?;
        self.quickstart_stage(scan, facts, cancel, report)
    }

    fn architecture_stage(
        &mut self,
        scan: &ScanSet,
        facts: &DetectionFacts,
        cancel: &CancelToken,
        report: &mut RunReport,
    ) -> Result<(), Cancelled> {
        let request = SummaryRequest::new(SummaryKind::Architecture, context::architecture(scan, facts));
        report.architecture = match self.call(&request, cancel, &mut report.usage)? {
            Ok(result) => result.text,
            Err(err) => {
                warn!("architecture summary failed: {err}");
                unavailable_text(SummaryKind::Architecture)
            }
        };
        Ok(())
    }

    fn module_stage(
        &mut self,
        scan: &ScanSet,
        cancel: &CancelToken,
        report: &mut RunReport,
    ) -> Result<(), Cancelled> {
        for module in select::key_modules(scan) {
            let request = SummaryRequest::new(SummaryKind::Module, context::module(scan, &module));
            match self.call(&request, cancel, &mut report.usage)? {
                Ok(result) => {
                    report.modules.insert(module, result.text);
                }
                Err(err) => warn!(module = %module, "module summary skipped: {err}"),
            }
        }
        Ok(())
    }

    fn file_stage(
        &mut self,
        scan: &ScanSet,
        cancel: &CancelToken,
        report: &mut RunReport,
    ) -> Result<(), Cancelled> {
        for file in select::top_files(scan) {
            let slice = match ContextSlice::read(
                file,
                self.budget.max_lines_per_file,
                self.budget.redact_secrets,
            ) {
                Ok(slice) => slice,
                Err(err) => {
                    debug!(path = %file.relative_path, "file dropped, unreadable: {err}");
                    continue;
                }
            };
            let text = slice.render();

            let role = SummaryRequest::new(SummaryKind::File, text.clone()).with_cache_key(&file.hash);
            let role = match self.call(&role, cancel, &mut report.usage)? {
                Ok(result) => result,
                Err(err) => {
                    warn!(path = %file.relative_path, "file summary skipped: {err}");
                    continue;
                }
            };

            let listing = SummaryRequest::new(SummaryKind::Function, text)
                .with_cache_key(format!("{}{FUNCTIONS_KEY_SUFFIX}", file.hash));
            let listing = match self.call(&listing, cancel, &mut report.usage)? {
                Ok(result) => result,
                Err(err) => {
                    warn!(path = %file.relative_path, "declaration listing skipped: {err}");
                    continue;
                }
            };

            report.files.insert(
                file.relative_path.clone(),
                FileSummary {
                    bullets: self.bullets(&listing.text),
                    cached: role.cached,
                    token_estimate: role.token_estimate + listing.token_estimate,
                    summary: role.text,
                },
            );
        }
        Ok(())
    }

    fn quickstart_stage(
        &mut self,
        scan: &ScanSet,
        facts: &DetectionFacts,
        cancel: &CancelToken,
        report: &mut RunReport,
    ) -> Result<(), Cancelled> {
        let request = SummaryRequest::new(SummaryKind::Quickstart, context::quickstart(scan, facts));
        let steps = match self.call(&request, cancel, &mut report.usage)? {
            Ok(result) => self.bullets(&result.text),
            Err(err) => {
                warn!("quickstart generation failed, using detected tooling: {err}");
                Vec::new()
            }
        };
        report.quickstart = if steps.is_empty() { fallback_steps(facts) } else { steps };
        Ok(())
    }

    /// Placeholder text is kept whole rather than parsed.
    fn bullets(&self, text: &str) -> Vec<String> {
        if self.generator.is_live() {
            parse_bullets(text)
        } else {
            vec![text.to_string()]
        }
    }

    /// Issues one call unless cancelled. The outer `Err` stops the run; the
    /// inner result is the call's own outcome.
    fn call(
        &mut self,
        request: &SummaryRequest,
        cancel: &CancelToken,
        usage: &mut Usage,
    ) -> Result<Result<GenerationResult, GenerationError>, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let outcome = self.generator.summarize(request, &mut self.limiter);
        match &outcome {
            Ok(result) if result.cached => usage.cache_hits += 1,
            Ok(_) => usage.generated += 1,
            Err(err) => {
                usage.failures += 1;
                debug!(kind = %request.kind, transient = err.is_transient(), "generation call failed");
            }
        }
        if let Ok(result) = &outcome {
            usage.token_estimate += result.token_estimate;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::PlaceholderGenerator;
    use crate::scan::{self, ScanOptions};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::rc::Rc;

    type Seen = Rc<RefCell<Vec<SummaryKind>>>;

    /// Generator answering from a script, recording each request kind.
    struct Scripted {
        replies: RefCell<VecDeque<Result<&'static str, GenerationError>>>,
        seen: Seen,
    }

    fn scripted(replies: Vec<Result<&'static str, GenerationError>>) -> (Scripted, Seen) {
        let seen = Seen::default();
        (Scripted { replies: RefCell::new(replies.into()), seen: Rc::clone(&seen) }, seen)
    }

    impl Generator for Scripted {
        fn summarize(
            &self,
            request: &SummaryRequest,
            _limiter: &mut RateLimiter,
        ) -> Result<GenerationResult, GenerationError> {
            self.seen.borrow_mut().push(request.kind);
            let reply =
                self.replies.borrow_mut().pop_front().unwrap_or(Err(GenerationError::EmptyResponse));
            reply.map(|text| GenerationResult { text: text.into(), cached: false, token_estimate: 5 })
        }
    }

    fn repo() -> (tempfile::TempDir, ScanSet) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        for name in ["a.go", "b.go", "c.go"] {
            fs::write(root.join("api").join(name), "package api\n").unwrap();
        }
        let scan = scan::scan(root, &ScanOptions::default(), &CancelToken::new()).unwrap();
        (dir, scan)
    }

    fn orchestrator(generator: impl Generator + 'static) -> Orchestrator {
        Orchestrator::new(Box::new(generator), RateLimiter::new(1000.0), ContextBudget::default())
    }

    #[test]
    fn placeholder_run_fills_every_field() {
        let (_dir, scan) = repo();
        let report = orchestrator(PlaceholderGenerator).run(
            &scan,
            &DetectionFacts::default(),
            &CancelToken::new(),
        );

        assert_eq!(report.architecture, "[architecture summary placeholder - dry run mode]");
        assert_eq!(report.modules["api"], "[module summary placeholder - dry run mode]");
        let main = &report.files["main.go"];
        assert_eq!(main.summary, "[file summary placeholder - dry run mode]");
        assert_eq!(main.bullets, vec!["[function summary placeholder - dry run mode]"]);
        assert_eq!(report.quickstart, vec!["[quickstart summary placeholder - dry run mode]"]);
        assert!(!report.partial);
    }

    #[test]
    fn stages_run_in_fixed_order_and_failures_skip_units() {
        let (_dir, scan) = repo();
        let (generator, seen) = scripted(vec![
            Ok("Overview."),
            Err(GenerationError::RateLimited), // module api
            Ok("Entry point."),                // main.go role
            Ok("- main() - starts"),           // main.go listing
            Ok("A."),                          // api/a.go role
            Err(GenerationError::Server { status: 500, message: "x".into() }),
            Ok("B."),
            Ok("- B"),
            Ok("C."),
            Ok("- C"),
            Ok("1. go build\n2. go run ."),
        ]);
        let report =
            orchestrator(generator).run(&scan, &DetectionFacts::default(), &CancelToken::new());

        assert_eq!(report.architecture, "Overview.");
        assert!(report.modules.is_empty());
        assert_eq!(report.files["main.go"].bullets, vec!["main() - starts"]);
        assert_eq!(report.files["main.go"].token_estimate, 10);
        assert!(!report.files.contains_key("api/a.go"));
        assert!(report.files.contains_key("api/b.go"));
        assert_eq!(report.quickstart, vec!["go build", "go run ."]);
        assert_eq!(report.usage.failures, 2);
        assert_eq!(report.usage.generated, 9);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 11);
        assert_eq!(seen[0], SummaryKind::Architecture);
        assert_eq!(seen[1], SummaryKind::Module);
        assert_eq!(seen[2], SummaryKind::File);
        assert_eq!(seen[3], SummaryKind::Function);
        assert_eq!(seen[10], SummaryKind::Quickstart);
    }

    #[test]
    fn failed_quickstart_falls_back_to_detected_tooling() {
        let (_dir, scan) = repo();
        let (generator, _) = scripted(vec![]);
        let report =
            orchestrator(generator).run(&scan, &DetectionFacts::default(), &CancelToken::new());

        assert_eq!(report.architecture, unavailable_text(SummaryKind::Architecture));
        assert!(report.files.is_empty());
        assert_eq!(report.quickstart[0], "Clone the repository");
    }

    #[test]
    fn cancelled_run_returns_partial_report_without_calls() {
        let (_dir, scan) = repo();
        let (generator, seen) = scripted(vec![Ok("never")]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = orchestrator(generator).run(&scan, &DetectionFacts::default(), &cancel);

        assert!(report.partial);
        assert!(report.architecture.is_empty());
        assert!(seen.borrow().is_empty());
    }

    /// Answers every call, then cancels the run.
    struct CancelsAfterReply {
        cancel: CancelToken,
        seen: Seen,
    }

    impl Generator for CancelsAfterReply {
        fn summarize(
            &self,
            request: &SummaryRequest,
            _limiter: &mut RateLimiter,
        ) -> Result<GenerationResult, GenerationError> {
            self.seen.borrow_mut().push(request.kind);
            self.cancel.cancel();
            Ok(GenerationResult { text: "Overview.".into(), cached: false, token_estimate: 3 })
        }
    }

    #[test]
    fn cancellation_between_calls_keeps_finished_stages() {
        let (_dir, scan) = repo();
        let cancel = CancelToken::new();
        let seen = Seen::default();
        let generator = CancelsAfterReply { cancel: cancel.clone(), seen: Rc::clone(&seen) };

        let report = orchestrator(generator).run(&scan, &DetectionFacts::default(), &cancel);

        assert!(report.partial);
        assert_eq!(report.architecture, "Overview.");
        assert!(report.modules.is_empty());
        assert!(report.files.is_empty());
        assert!(report.quickstart.is_empty());
        assert_eq!(*seen.borrow(), vec![SummaryKind::Architecture]);
        assert_eq!(report.usage.generated, 1);
    }

    #[test]
    fn file_removed_after_scan_is_dropped_alone() {
        let (dir, scan) = repo();
        fs::remove_file(dir.path().join("api").join("b.go")).unwrap();

        let report = orchestrator(PlaceholderGenerator).run(
            &scan,
            &DetectionFacts::default(),
            &CancelToken::new(),
        );

        let files: Vec<_> = report.files.keys().map(String::as_str).collect();
        assert_eq!(files, vec!["api/a.go", "api/c.go", "main.go"]);
        assert!(!report.partial);
        assert_eq!(report.usage.failures, 0);
    }
}
