//! Registry of locomotive engines and the shared tick loop.
//!
//! The [`Collector`] owns one [`LocoEngine`] per registered address and the
//! [`SoundPlayer`] they all play through. Decoded status reports are routed
//! with [`Collector::dispatch`]; pending chuffs fire from [`Collector::tick`].
//!
//! # Example
//!
//! ```rust
//! use loco_sound::{Collector, LocoStatus, Frame};
//! use loco_sound::hal::MockPlayer;
//!
//! let mut collector = Collector::new(MockPlayer::new());
//! collector.register(232);
//! collector.register(2);
//!
//! // Reports for unknown addresses are ignored
//! let frame = Frame::with_payload([0x40, 0x00], 0xEF, [0x00, 0x4D, 0x04, 0x8B]);
//! collector.dispatch(&LocoStatus::decode(&frame).unwrap(), 0);
//! assert!(collector.engine(77).is_none());
//!
//! // Nothing scheduled, nothing fires
//! assert_eq!(collector.tick(10_000), 0);
//! ```

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use crate::client::Z21Client;
use crate::config::{ChuffProfile, SoundConfig};
use crate::engine::{LocoEngine, ScheduledAction};
use crate::status::LocoStatus;
use crate::traits::{SoundPlayer, Transport};

/// Engines by address plus the sound player they share.
#[derive(Debug)]
pub struct Collector<P: SoundPlayer> {
    engines: BTreeMap<u16, LocoEngine>,
    player: P,
    sound: SoundConfig,
    chuff: ChuffProfile,
}

impl<P: SoundPlayer> Collector<P> {
    /// Create a collector with default sound settings.
    pub fn new(player: P) -> Self {
        Self::with_config(player, SoundConfig::default(), ChuffProfile::default())
    }

    /// Create a collector whose engines use the given settings.
    pub fn with_config(player: P, sound: SoundConfig, chuff: ChuffProfile) -> Self {
        Self {
            engines: BTreeMap::new(),
            player,
            sound,
            chuff,
        }
    }

    /// Register an address. Registering twice keeps the existing engine.
    pub fn register(&mut self, address: u16) -> &mut LocoEngine {
        let Self {
            engines,
            player,
            sound,
            chuff,
        } = self;
        engines.entry(address).or_insert_with(|| {
            info!(address, "locomotive registered");
            let engine = LocoEngine::with_config(address, *chuff, *sound);
            engine.apply_volumes(player);
            engine
        })
    }

    /// Drop an engine and its pending callback.
    pub fn remove(&mut self, address: u16) -> Option<LocoEngine> {
        let removed = self.engines.remove(&address);
        if removed.is_some() {
            info!(address, "locomotive removed");
        }
        removed
    }

    /// Engine for an address, if registered.
    pub fn engine(&self, address: u16) -> Option<&LocoEngine> {
        self.engines.get(&address)
    }

    /// Engine for an address, registering it on first use.
    pub fn engine_mut(&mut self, address: u16) -> &mut LocoEngine {
        self.register(address)
    }

    /// Registered addresses, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = u16> + '_ {
        self.engines.keys().copied()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// True if no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// The shared sound player.
    pub fn player(&self) -> &P {
        &self.player
    }

    /// Mutable access to the sound player.
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Route a status report to its engine.
    ///
    /// Returns `false` (and does nothing) if the address is not registered.
    pub fn dispatch(&mut self, status: &LocoStatus, now_ms: u64) -> bool {
        match self.engines.get_mut(&status.address) {
            Some(engine) => {
                trace!(address = status.address, speed = status.speed, "status dispatched");
                engine.apply_status(status, now_ms, &mut self.player);
                true
            }
            None => {
                debug!(address = status.address, "status for unregistered locomotive ignored");
                false
            }
        }
    }

    /// Fire every callback due at `now_ms`.
    ///
    /// Due actions are collected from all engines first, then executed, so
    /// callbacks scheduled while firing wait for the next tick. Returns the
    /// number of actions fired.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        let due: Vec<(u16, ScheduledAction)> = self
            .engines
            .iter_mut()
            .filter_map(|(&address, engine)| engine.take_due(now_ms).map(|action| (address, action)))
            .collect();

        for &(address, action) in &due {
            if let Some(engine) = self.engines.get_mut(&address) {
                engine.run_scheduled(action, now_ms, &mut self.player);
            }
        }
        due.len()
    }

    /// One poll loop iteration: receive at most one frame, dispatch it if
    /// it is a status report, then [`tick`](Self::tick).
    ///
    /// Transport errors are logged and the iteration carries on, so a
    /// transient socket failure never stops the loop. Returns the number
    /// of scheduled actions fired.
    pub fn service<T: Transport>(&mut self, client: &mut Z21Client<T>, now_ms: u64) -> usize {
        match client.poll(now_ms) {
            Ok(Some(frame)) => match LocoStatus::decode(&frame) {
                Ok(status) => {
                    debug!(%status, "status");
                    self.dispatch(&status, now_ms);
                }
                Err(error) => debug!(%error, "ignored frame"),
            },
            Ok(None) => {}
            Err(error) => warn!(?error, "poll failed"),
        }
        self.tick(now_ms)
    }

    /// Earliest pending callback across all engines.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.engines
            .values()
            .filter_map(|engine| engine.next_due().map(|scheduled| scheduled.due_ms))
            .min()
    }
}
