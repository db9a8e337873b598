//! Monotonic millisecond tick source and cooperative sleeps.
//!
//! Every wait in this crate is a bounded polling loop with short sleeps
//! between checks; `sleep_ms` is the single suspension point, so frontend
//! implementations can pump their event loop inside it without anything
//! else in the core knowing.

use std::time::{Duration, Instant};

/// Tick source shared by the whole session.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch. Monotonic; may wrap on
    /// constrained targets.
    fn now_ms(&self) -> u64;

    /// Cooperative idle for roughly `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

/// Elapsed milliseconds between two ticks, never underflowing.
///
/// A `then` tick that appears to lie in the future (counter wrap) reads as
/// zero elapsed rather than a huge interval, so cadence gates simply re-arm
/// on the next tick.
pub fn elapsed(now: u64, then: u64) -> u64 {
    now.saturating_sub(then)
}

/// Host clock backed by [`Instant`].
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_forward() {
        assert_eq!(elapsed(1500, 1000), 500);
        assert_eq!(elapsed(1000, 1000), 0);
    }

    #[test]
    fn test_elapsed_never_underflows() {
        // `then` after `now` (wrapped counter) reads as zero, not u64::MAX
        assert_eq!(elapsed(10, u64::MAX), 0);
        assert_eq!(elapsed(0, 1), 0);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let t0 = clock.now_ms();
        clock.sleep_ms(5);
        assert!(clock.now_ms() >= t0);
    }
}
