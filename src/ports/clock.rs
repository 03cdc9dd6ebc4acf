//! Clock port for monotonic time and blocking waits.

use std::time::{Duration, Instant};

/// Provides monotonic time and the ability to block.
///
/// The rate limiter goes through this port so tests can substitute a clock
/// that advances instantly instead of sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current monotonic instant.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}
