//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `codedoc`.
#[derive(Debug, Parser)]
#[command(name = "codedoc", version, about = "Summarize a source tree into a structured report")]
pub struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a tree and generate summaries.
    Generate(GenerateArgs),
    /// Print the version.
    Version,
}

/// Flags for `generate`. Unset flags leave the config file value alone.
#[derive(Debug, Args, Default)]
pub struct GenerateArgs {
    /// Directory to scan.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Output record path.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Maximum files to scan.
    #[arg(long)]
    pub max_files: Option<usize>,
    /// Maximum excerpt lines per file.
    #[arg(long)]
    pub max_lines_per_file: Option<usize>,
    /// Include test files.
    #[arg(long)]
    pub include_tests: bool,
    /// Use placeholders instead of calling the generation service.
    #[arg(long)]
    pub dry_run: bool,
    /// Comma-separated language filter, e.g. `go,py,ts`.
    #[arg(long, value_delimiter = ',')]
    pub lang: Option<Vec<String>>,
    /// Send file excerpts without masking secrets.
    #[arg(long)]
    pub no_redact_secrets: bool,
    /// Ignore cached results.
    #[arg(long)]
    pub force: bool,
    /// Maximum generation calls per second.
    #[arg(long)]
    pub max_qps: Option<f64>,
    /// Cache directory (relative paths resolve under `--path`).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// YAML config file (defaults to `<path>/.codedoc.yaml` when present).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Serve completions from a recorded cassette instead of the network.
    #[arg(long, conflicts_with = "dry_run")]
    pub replay: Option<PathBuf>,
    /// Stop after this many seconds and write a partial record.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::parse_from([
            "codedoc",
            "generate",
            "--path",
            "repo",
            "--lang",
            "go,py",
            "--max-files",
            "3",
            "--dry-run",
            "--no-redact-secrets",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.path, PathBuf::from("repo"));
        assert_eq!(args.lang, Some(vec!["go".to_string(), "py".to_string()]));
        assert_eq!(args.max_files, Some(3));
        assert!(args.dry_run);
        assert!(args.no_redact_secrets);
        assert!(args.max_qps.is_none());
    }

    #[test]
    fn path_defaults_to_current_dir() {
        let cli = Cli::parse_from(["codedoc", "generate"]);
        assert!(matches!(cli.command, Command::Generate(ref a) if a.path == PathBuf::from(".")));
    }

    #[test]
    fn replay_conflicts_with_dry_run() {
        assert!(Cli::try_parse_from(["codedoc", "generate", "--dry-run", "--replay", "x"]).is_err());
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::parse_from(["codedoc", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }
}
