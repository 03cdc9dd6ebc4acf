//! Command dispatch and handlers.

pub mod generate;

use std::env;
use std::path::PathBuf;

use crate::cli::Command;
use crate::error::Result;

/// Environment variable naming a cassette file to record live calls into.
pub const RECORD_ENV: &str = "CODEDOC_RECORD";

/// Dispatch a parsed command to its handler.
///
/// When `CODEDOC_RECORD` is set, live generation calls are recorded to that
/// cassette file.
///
/// # Errors
///
/// Returns the handler's error.
pub fn dispatch(command: &Command) -> Result<()> {
    match command {
        Command::Generate(args) => {
            let record_to = env::var_os(RECORD_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
            generate::run(args, record_to.as_deref())
        }
        Command::Version => {
            println!("codedoc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
