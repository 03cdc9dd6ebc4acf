//! `codedoc generate` command.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::cancel::CancelToken;
use crate::cli::GenerateArgs;
use crate::config::GenerateOptions;
use crate::context::{RecordingSession, ServiceContext};
use crate::detect::ManifestDetector;
use crate::error::{ConfigError, Result};
use crate::pipeline::{self, GeneratorMode};

/// Execute the `generate` command and write the output record.
///
/// # Errors
///
/// Returns configuration, credential, scan or output errors. Failed
/// generation calls only degrade the record.
pub fn run(args: &GenerateArgs, record_to: Option<&Path>) -> Result<()> {
    let options = resolve_options(args)?;
    // Before credentials: a bad root is a config error even on a live run.
    options.validate()?;
    let cancel = args
        .timeout_secs
        .map_or_else(CancelToken::new, |secs| CancelToken::with_timeout(Duration::from_secs(secs)));

    let (mode, session) = generator_mode(&options, args.replay.as_deref(), record_to)?;
    let record = pipeline::run(&options, mode, &ManifestDetector, &cancel);

    // The generator and its client are gone by now, so the recorder is free.
    if let Some(session) = session {
        let path = session.finish()?;
        eprintln!("Recording saved to: {}", path.display());
    }
    let record = record?;

    println!("Scanned {} files ({} lines)", record.total_files, record.total_lines);
    record.write(&options.output)?;
    if record.report.partial {
        println!("Run stopped early; report is partial");
    }
    println!("Report data written to {}", options.output.display());
    info!(
        modules = record.report.modules.len(),
        files = record.report.files.len(),
        "generate: done"
    );
    Ok(())
}

/// Config file plus command-line flags.
///
/// # Errors
///
/// Returns [`ConfigError::File`] for an unreadable or invalid config file.
pub fn resolve_options(args: &GenerateArgs) -> std::result::Result<GenerateOptions, ConfigError> {
    let mut options = GenerateOptions::load(&args.path, args.config.as_deref())?;
    if let Some(out) = &args.out {
        options.output.clone_from(out);
    }
    if let Some(max_files) = args.max_files {
        options.max_files = max_files;
    }
    if let Some(max_lines) = args.max_lines_per_file {
        options.max_lines_per_file = max_lines;
    }
    if let Some(lang) = &args.lang {
        options.languages.clone_from(lang);
    }
    if let Some(qps) = args.max_qps {
        options.max_requests_per_second = qps;
    }
    if let Some(dir) = &args.cache_dir {
        options.cache_dir = Some(dir.clone());
    }
    options.include_tests |= args.include_tests;
    options.dry_run |= args.dry_run;
    options.force |= args.force;
    if args.no_redact_secrets {
        options.redact_secrets = false;
    }
    Ok(options)
}

fn generator_mode(
    options: &GenerateOptions,
    replay: Option<&Path>,
    record_to: Option<&Path>,
) -> Result<(GeneratorMode, Option<RecordingSession>)> {
    if options.dry_run {
        info!("dry run: placeholders only");
        return Ok((GeneratorMode::Placeholder, None));
    }
    let ctx = match (replay, record_to) {
        (Some(cassette), _) => ServiceContext::replaying(cassette)?,
        (None, Some(path)) => ServiceContext::recording(path)?,
        (None, None) => ServiceContext::live()?,
    };
    let (llm, session) = ctx.into_parts();
    Ok((GeneratorMode::Llm(llm), session))
}
