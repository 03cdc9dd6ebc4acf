//! Core library for the `codedoc` CLI.
//!
//! The pipeline runs scan → select → budget → cache → generate and produces
//! an [`output::OutputRecord`] for an external report renderer.

pub mod adapters;
pub mod budget;
pub mod cache;
pub mod cancel;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod detect;
pub mod error;
pub mod generate;
pub mod orchestrate;
pub mod output;
pub mod pipeline;
pub mod ports;
pub mod ratelimit;
pub mod scan;
pub mod select;

use clap::Parser;

pub use error::{CodedocError, Result};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command).map_err(|err| err.to_string())
}
