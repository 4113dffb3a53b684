//! Time sources for the session engine.
//!
//! The engine itself never reads the clock -- every command takes an
//! explicit `now_ms` argument. Callers that need a clock (the controller,
//! the CLI run loop) take one through the [`Clock`] trait so tests can
//! substitute [`ManualClock`] and drive time by hand.

use std::cell::Cell;

/// A monotone-enough source of epoch milliseconds.
///
/// Elapsed-time math downstream uses saturating subtraction, so a reading
/// that steps backward yields an elapsed time of zero rather than an
/// underflow.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Hand-advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.set(100);
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn system_clock_is_nonzero() {
        assert!(SystemClock.now_ms() > 0);
    }
}
