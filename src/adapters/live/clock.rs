//! Live clock using the system monotonic clock.

use std::time::{Duration, Instant};

use crate::ports::clock::Clock;

/// Live clock that reads `Instant::now` and really sleeps.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
