#![forbid(unsafe_code)]

//! Host-controlled monotonic time.
//!
//! The core never reads a wall clock. Browsers pass `performance.now()`;
//! tests and the simulated host advance a [`DeterministicClock`].

use core::time::Duration;

/// Source of monotonic time since an arbitrary origin.
pub trait MonotonicClock {
    fn now_mono(&self) -> Duration;
}

/// Monotonic clock advanced explicitly by its owner.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Move to `at`; earlier instants are ignored so time never runs backwards.
    pub fn advance_to(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl MonotonicClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Convert a `performance.now()` style millisecond timestamp.
#[must_use]
pub fn from_millis_f64(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f64(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}
