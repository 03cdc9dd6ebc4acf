//! Error types for the scan → budget → cache → generate pipeline.
//!
//! [`CodedocError`] is the single top-level error. Domain errors live in
//! nested enums so callers can match on the failure class:
//!
//! - [`ConfigError`]: fatal, raised before any scanning begins.
//! - [`ScanError`]: only for an unreadable or missing scan root. Per-file read
//!   failures never surface; the file is dropped from the scan.
//! - [`GenerationError`]: transient failures skip one unit of work; a
//!   missing credential at construction time aborts the run.
//!
//! Cache corruption has no variant on purpose: a bad entry is a miss.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the whole crate.
pub type Result<T> = std::result::Result<T, CodedocError>;

/// Top-level error for `codedoc`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodedocError {
    /// Invalid options, detected before the pipeline starts.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The scan root could not be traversed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A generation failure that escaped a stage (construction time only).
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Writing an output artifact failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An output record or cassette could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Configuration and budget validation errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The scan root does not exist or is not a directory.
    #[error("invalid root path: {0}")]
    InvalidRoot(PathBuf),

    /// A numeric budget was zero.
    #[error("{0} must be positive")]
    NonPositiveBudget(&'static str),

    /// The request rate was zero, negative, not finite, or so small that the
    /// interval between calls overflows.
    #[error("max requests per second must be a positive number, got {0}")]
    InvalidRate(f64),

    /// The YAML config file could not be read or parsed.
    #[error("failed to load config file {path}: {reason}")]
    File {
        /// Config file path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },
}

/// Errors raised while walking the scan root.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root is missing or unreadable.
    #[error("cannot read scan root {path}: {reason}")]
    UnreadableRoot {
        /// Root that was requested.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },
}

/// Failures of a single generation call, or of building the generator.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key was available when the live generator was built.
    #[error("missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    /// The request never got a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered HTTP 429.
    #[error("rate limited by the generation service")]
    RateLimited,

    /// The service answered with a non-success status.
    #[error("generation service error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The service answered 2xx with no text.
    #[error("empty response from generation service")]
    EmptyResponse,

    /// The response body did not decode.
    #[error("failed to decode generation response: {0}")]
    Decode(String),

    /// A replayed cassette had no completion for this call.
    #[error("replay failed: {0}")]
    Replay(String),
}

impl GenerationError {
    /// Returns `true` when the failure only affects one unit of work.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MissingCredentials(_))
    }
}
