// ABOUTME: Time provider abstraction
// ABOUTME: Real wall-clock source and a manually driven source for tests

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

/// A source of "now" in Unix epoch milliseconds
///
/// Time-dependent code should take a `TimeSource` instead of reading the
/// system clock directly, so it can be handed either real or virtual time.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> f64;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    #[inline]
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    #[inline]
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Real wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemClock {
    #[inline]
    fn now_ms(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1000.0
    }
}

/// Time source that only moves when told to
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and give another to the clock under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a manual clock starting at `start_ms`
    pub fn new(start_ms: f64) -> Self {
        Self {
            current: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Move the clock to an absolute instant (backward jumps allowed)
    pub fn set(&self, ms: f64) {
        *self.current.lock() = ms;
    }

    /// Advance the clock by `delta_ms`
    pub fn advance(&self, delta_ms: f64) {
        *self.current.lock() += delta_ms;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.current.lock()
    }
}
