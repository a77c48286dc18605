//! Desktop clock backed by `std::time::Instant`.

use std::time::Instant;

use crate::traits::Clock;

/// Monotonic clock counting milliseconds since construction.
///
/// # Example
///
/// ```rust
/// use loco_sound::hal::SystemClock;
/// use loco_sound::traits::Clock;
///
/// let clock = SystemClock::new();
/// let start = clock.now_ms();
/// assert!(clock.now_ms() >= start);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Creates a clock starting at 0.
    #[inline]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
