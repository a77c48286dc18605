//! Datagram transport abstraction.
//!
//! The Z21 speaks plain UDP. The session client only needs to send a
//! datagram and to poll for one without blocking, so the poll loop keeps
//! its tick cadence even when the station is silent.
//!
//! # Implementation Notes
//!
//! - `send` transmits one complete datagram
//! - `try_receive` must never block; return `Ok(None)` when nothing is queued
//! - Implementations own addressing (the station's host and port)

/// Non-blocking datagram transport to the command station.
pub trait Transport {
    /// Error type for transport operations.
    type Error: core::fmt::Debug;

    /// Send one datagram.
    fn send(&mut self, datagram: &[u8]) -> Result<(), Self::Error>;

    /// Receive one datagram if available (non-blocking).
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, Self::Error>;
}
