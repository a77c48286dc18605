//! Collaborator traits.
//!
//! The core (codec, decoder, engines, collector) reaches the outside world
//! only through these traits:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`SoundPlayer`] | Fire-and-forget audio playback |
//! | [`Transport`] | Non-blocking UDP datagrams to the command station |
//! | [`Clock`] | Monotonic millisecond time |
//!
//! Mock implementations for tests live in [`crate::hal::mock`].

pub mod audio;
pub mod clock;
pub mod network;

pub use audio::*;
pub use clock::*;
pub use network::*;
