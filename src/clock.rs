//! Wall-clock abstraction.
//!
//! The limiter only ever asks "what is the current epoch-millisecond
//! instant?". Putting that question behind a trait lets tests drive
//! simulated time without sleeping.

use std::sync::Arc;

use parking_lot::Mutex;

/// Source of the current time as epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current instant in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// A manually advanced clock for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<u64>>,
}

impl ManualClock {
    /// Create a clock starting at the given epoch-millisecond instant.
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_millis)),
        }
    }

    /// Advance the clock by `millis`.
    pub fn advance(&self, millis: u64) {
        *self.now.lock() += millis;
    }

    /// Set the clock to an absolute instant. Moving backward is allowed;
    /// the limiter tolerates it.
    pub fn set(&self, millis: u64) {
        *self.now.lock() = millis;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        *self.now.lock()
    }
}
