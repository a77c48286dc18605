//! Audio playback abstraction.
//!
//! The engine never touches sample data. It asks a [`SoundPlayer`] to play,
//! loop or stop a sound identified by a [`SoundId`]: the locomotive address
//! plus a symbolic [`Sound`]. Mapping ids to actual files or buffers is the
//! player's business.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use loco_sound::traits::{SoundId, SoundPlayer};
//!
//! struct Mixer { /* channels */ }
//!
//! impl SoundPlayer for Mixer {
//!     type Error = MixerError;
//!
//!     fn play_once(&mut self, id: SoundId) -> Result<(), MixerError> {
//!         self.channel_for(id)?.play(1)
//!     }
//!     // ...
//! }
//! ```

use core::fmt;

/// Symbolic sound of a locomotive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Sound {
    /// Steam release played when the locomotive starts moving.
    Start,
    /// One cylinder exhaust beat; chuffs cycle through cylinders.
    Cylinder(u8),
    /// Horn / whistle (F7).
    Horn,
    /// Continuous running ambience (F6).
    Ambient,
    /// Continuous idle ambience (F9).
    Idle,
    /// Brake squeal on stopping.
    Brakes,
}

impl Sound {
    /// Short lowercase name, used for logging and file lookup.
    pub const fn name(&self) -> &'static str {
        match self {
            Sound::Start => "start",
            Sound::Cylinder(_) => "cylinder",
            Sound::Horn => "horn",
            Sound::Ambient => "ambient",
            Sound::Idle => "idle",
            Sound::Brakes => "brakes",
        }
    }
}

/// A sound belonging to one locomotive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundId {
    /// Locomotive address.
    pub address: u16,
    /// Which sound.
    pub sound: Sound,
}

impl SoundId {
    /// Creates a sound id.
    pub const fn new(address: u16, sound: Sound) -> Self {
        Self { address, sound }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sound {
            Sound::Cylinder(n) => write!(f, "loco #{} cylinder {}", self.address, n),
            other => write!(f, "loco #{} {}", self.address, other.name()),
        }
    }
}

/// Audio playback collaborator.
///
/// All calls are fire-and-forget: implementations start playback and
/// return immediately.
pub trait SoundPlayer {
    /// Error type for playback operations.
    type Error: fmt::Debug;

    /// Play a sound once.
    fn play_once(&mut self, id: SoundId) -> Result<(), Self::Error>;

    /// Play a sound in a loop until [`stop_loop`](Self::stop_loop).
    fn play_loop(&mut self, id: SoundId) -> Result<(), Self::Error>;

    /// Stop a looping sound. Stopping a sound that is not playing is a no-op.
    fn stop_loop(&mut self, id: SoundId) -> Result<(), Self::Error>;

    /// Set playback volume, 0.0 to 1.0.
    fn set_volume(&mut self, id: SoundId, level: f32) -> Result<(), Self::Error>;
}
