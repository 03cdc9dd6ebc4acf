//! Cassettes: recorded generation-service interactions for deterministic replay.

pub mod format;
pub mod recorder;
pub mod replayer;
