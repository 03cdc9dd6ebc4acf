//! Replaying adapters that serve recorded interactions.

pub mod llm;

use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

pub use llm::ReplayingLlmClient;

/// Pull the next recorded output for `port`/`method`.
///
/// Mirror of `recording::record_result`'s bookkeeping.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, String> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).map(|i| i.output.clone())
}

/// Decode a `{"Ok": v}` / `{"Err": msg}` output into a `Result`.
///
/// The outer error carries the recorded message, or a description of why
/// the output could not be decoded.
pub(crate) fn replay_result<T: DeserializeOwned>(output: serde_json::Value) -> Result<T, String> {
    if let Some(ok) = output.get("Ok") {
        return serde_json::from_value(ok.clone())
            .map_err(|e| format!("recorded Ok value does not decode: {e}"));
    }
    match output.get("Err") {
        Some(serde_json::Value::String(msg)) => Err(msg.clone()),
        Some(other) => Err(other.to_string()),
        None => Err(format!("recorded output has neither Ok nor Err: {output}")),
    }
}
