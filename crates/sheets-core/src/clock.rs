#![forbid(unsafe_code)]

//! Monotonic clocks.
//!
//! The engine measures call gaps and animation timeouts against a [`Clock`].
//! Hosts either drive time explicitly ([`DeterministicClock`], used by tests
//! and replay) or read the platform monotonic clock ([`WebClock`], which also
//! works on `wasm32-unknown-unknown` through `web-time`).

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Source of monotonic time since an arbitrary origin.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Duration;
}

/// Host-controlled clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct DeterministicClock {
    now: Rc<Cell<Duration>>,
}

impl DeterministicClock {
    /// Create a clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time. Time never moves backwards.
    pub fn set(&self, now: Duration) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }

    /// Advance time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl Clock for DeterministicClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Platform monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct WebClock {
    origin: Instant,
}

impl Default for WebClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WebClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for WebClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
