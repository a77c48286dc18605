//! Sound player that only logs.

use core::convert::Infallible;

use tracing::info;

use crate::traits::{SoundId, SoundPlayer};

/// Emits a `tracing` event per playback call instead of producing audio.
///
/// Useful for running against a real station without a sound backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPlayer;

impl LogPlayer {
    /// Creates a log player.
    pub fn new() -> Self {
        Self
    }
}

impl SoundPlayer for LogPlayer {
    type Error = Infallible;

    fn play_once(&mut self, id: SoundId) -> Result<(), Infallible> {
        info!(%id, "play");
        Ok(())
    }

    fn play_loop(&mut self, id: SoundId) -> Result<(), Infallible> {
        info!(%id, "loop");
        Ok(())
    }

    fn stop_loop(&mut self, id: SoundId) -> Result<(), Infallible> {
        info!(%id, "stop");
        Ok(())
    }

    fn set_volume(&mut self, id: SoundId, level: f32) -> Result<(), Infallible> {
        info!(%id, level, "volume");
        Ok(())
    }
}
