//! Time source abstraction.
//!
//! Every scheduling decision in the crate takes an explicit `now_ms`
//! argument. The [`Clock`] trait is where the poll loop gets it from.
//!
//! # Example
//!
//! ```rust
//! use loco_sound::traits::Clock;
//! use loco_sound::hal::MockClock;
//!
//! let mut clock = MockClock::new();
//! assert_eq!(clock.now_ms(), 0);
//!
//! clock.advance(100);
//! assert_eq!(clock.now_ms(), 100);
//! ```

/// Monotonic millisecond time source.
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
