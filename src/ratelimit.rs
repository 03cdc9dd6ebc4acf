//! Minimum-interval rate limiter for outbound generation calls.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::adapters::live::clock::LiveClock;
use crate::ports::clock::Clock;

/// Enforces a minimum interval between consecutive calls to [`RateLimiter::wait`].
///
/// One instance per run, owned by the orchestrator and lent to each
/// generation call site.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
    clock: Box<dyn Clock>,
}

impl RateLimiter {
    /// Creates a limiter allowing at most `max_requests_per_second`.
    ///
    /// Non-positive or non-finite rates disable waiting; config validation
    /// rejects them, and rates too small to express as an interval, before a
    /// run starts.
    #[must_use]
    pub fn new(max_requests_per_second: f64) -> Self {
        Self::with_clock(max_requests_per_second, Box::new(LiveClock))
    }

    /// Creates a limiter driven by the given clock.
    #[must_use]
    pub fn with_clock(max_requests_per_second: f64, clock: Box<dyn Clock>) -> Self {
        let min_interval = if max_requests_per_second.is_finite() && max_requests_per_second > 0.0 {
            // Intervals too long for `Duration` saturate.
            Duration::try_from_secs_f64(1.0 / max_requests_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self { min_interval, last_call: None, clock }
    }

    /// Minimum spacing between calls.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Blocks until the minimum interval since the previous call has passed.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let pause = self.min_interval - elapsed;
                debug!("rate limit: waiting {pause:?}");
                self.clock.sleep(pause);
            }
        }
        self.last_call = Some(self.clock.now());
    }
}
