//! Per-locomotive state engine and chuff scheduler.
//!
//! A [`LocoEngine`] keeps the last known functions, speed and direction of
//! one locomotive. Each [`LocoStatus`] is diffed against that state:
//!
//! 1. Changed functions run their built-in reaction, then their observers.
//! 2. A changed speed reschedules the next chuff.
//!
//! # Chuff Timing
//!
//! The chuff interval follows [`ChuffProfile::interval_ms`], by default
//! `4.6 * speed^-0.75` seconds. At most one chuff is pending at any time:
//!
//! - **Cold start** (speed leaves 0): start sound and a chuff play at once,
//!   the next chuff is due one interval later.
//! - **Speed change while running**: no sound; the pending chuff moves to
//!   `last_chuff + (new_interval + last_interval) / 2`, averaging the old and
//!   new pace.
//! - **Due chuff**: plays, then schedules the next one a full interval later.
//! - **Stop**: pending chuff and chuff history are cleared.
//!
//! # Example
//!
//! ```rust
//! use loco_sound::{LocoEngine, LocoStatus, Frame};
//! use loco_sound::hal::MockPlayer;
//!
//! let mut engine = LocoEngine::new(3);
//! let mut player = MockPlayer::new();
//!
//! // 126 steps, magnitude 61 -> speed 60
//! let frame = Frame::with_payload([0x40, 0x00], 0xEF, [0x00, 0x03, 0x04, 0x80 | 61]);
//! engine.apply_status(&LocoStatus::decode(&frame).unwrap(), 1_000, &mut player);
//!
//! let next = engine.next_due().unwrap();
//! assert_eq!(next.due_ms, 1_000 + 213);
//!
//! // Nothing is due yet
//! assert!(engine.take_due(1_100).is_none());
//! ```

use heapless::Deque;
use tracing::{debug, info, trace, warn};

use crate::config::{ChuffProfile, SoundConfig};
use crate::functions::{FunctionChange, FunctionReaction, Observers};
use crate::status::{Direction, FunctionMap, LocoStatus};
use crate::traits::{Sound, SoundId, SoundPlayer};

/// Number of speed changes kept in the history.
pub const SPEED_HISTORY_LEN: usize = 5;

/// Work an engine can schedule for later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Play the next chuff and schedule the following one.
    Chuff,
}

/// The single pending callback of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
    /// Time the action becomes due, in milliseconds.
    pub due_ms: u64,
    /// What to do.
    pub action: ScheduledAction,
}

/// Simulation state of one locomotive.
#[derive(Debug)]
pub struct LocoEngine {
    address: u16,
    functions: FunctionMap,
    speed: u16,
    direction: Direction,
    pending: Option<Scheduled>,
    last_chuff_ms: Option<u64>,
    last_chuff_interval_ms: Option<u64>,
    next_cylinder: u8,
    speed_history: Deque<(u64, u16), SPEED_HISTORY_LEN>,
    observers: Observers,
    chuff: ChuffProfile,
    sound: SoundConfig,
}

impl LocoEngine {
    /// Engine with the default chuff profile and sound settings.
    pub fn new(address: u16) -> Self {
        Self::with_config(address, ChuffProfile::default(), SoundConfig::default())
    }

    /// Engine with explicit chuff profile and sound settings.
    pub fn with_config(address: u16, chuff: ChuffProfile, sound: SoundConfig) -> Self {
        Self {
            address,
            functions: FunctionMap::new(),
            speed: 0,
            direction: Direction::default(),
            pending: None,
            last_chuff_ms: None,
            last_chuff_interval_ms: None,
            next_cylinder: 0,
            speed_history: Deque::new(),
            observers: Observers::new(),
            chuff,
            sound,
        }
    }

    /// Locomotive address.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Last known function states.
    pub fn functions(&self) -> &FunctionMap {
        &self.functions
    }

    /// Last known state of one function (unknown = off).
    pub fn function(&self, index: u16) -> bool {
        self.functions.get(&index).copied().unwrap_or(false)
    }

    /// Last known speed.
    pub fn speed(&self) -> u16 {
        self.speed
    }

    /// Last known direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The pending callback, if any.
    pub fn next_due(&self) -> Option<Scheduled> {
        self.pending
    }

    /// Time the last chuff played.
    pub fn last_chuff_ms(&self) -> Option<u64> {
        self.last_chuff_ms
    }

    /// Interval used when the last chuff was scheduled.
    pub fn last_chuff_interval_ms(&self) -> Option<u64> {
        self.last_chuff_interval_ms
    }

    /// Last speed changes as `(time_ms, speed)`, oldest first.
    pub fn speed_history(&self) -> impl Iterator<Item = &(u64, u16)> + '_ {
        self.speed_history.iter()
    }

    /// Bind an observer to a function index.
    pub fn bind_observer<F>(&mut self, index: u16, observer: F)
    where
        F: FnMut(&FunctionChange<'_>) + Send + 'static,
    {
        debug!(address = self.address, index, "observer bound");
        self.observers.bind(index, observer);
    }

    /// Push the configured volumes to the player.
    pub fn apply_volumes<P: SoundPlayer>(&self, player: &mut P) {
        let volumes = [
            (Sound::Start, self.sound.start_volume),
            (Sound::Brakes, self.sound.brake_volume),
        ];
        for (sound, level) in volumes {
            let id = self.sound_id(sound);
            if let Err(error) = player.set_volume(id, level) {
                warn!(%id, ?error, "setting volume failed");
            }
        }
    }

    /// Apply a status report.
    ///
    /// Runs function reactions for every changed function, then reschedules
    /// the chuff if the speed changed. Playback errors are logged and do not
    /// interrupt the update.
    pub fn apply_status<P: SoundPlayer>(&mut self, status: &LocoStatus, now_ms: u64, player: &mut P) {
        for (&index, &new_value) in &status.functions {
            let old_value = self.function(index);
            if new_value != old_value {
                if let Some(reaction) = FunctionReaction::builtin(index) {
                    info!(address = self.address, index, new_value, ?reaction, "function reaction");
                    if let Err(error) = reaction.run(self.address, new_value, player) {
                        warn!(address = self.address, index, ?error, "function reaction failed");
                    }
                }
                self.observers.notify(&FunctionChange {
                    index,
                    new_value,
                    old_value,
                    functions: &status.functions,
                });
            }
            self.functions.insert(index, new_value);
        }

        self.direction = status.direction;
        if status.speed != self.speed {
            self.speed = status.speed;
            self.speed_changed(now_ms, player);
        }
    }

    /// Remove and return the pending action if it is due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Option<ScheduledAction> {
        match self.pending {
            Some(scheduled) if scheduled.due_ms <= now_ms => {
                self.pending = None;
                Some(scheduled.action)
            }
            _ => None,
        }
    }

    /// Run an action previously returned by [`take_due`](Self::take_due).
    pub fn run_scheduled<P: SoundPlayer>(
        &mut self,
        action: ScheduledAction,
        now_ms: u64,
        player: &mut P,
    ) {
        match action {
            ScheduledAction::Chuff => self.chuff_due(now_ms, player),
        }
    }

    /// Drop the pending callback and the chuff history.
    pub fn clear_schedule(&mut self) {
        self.pending = None;
        self.last_chuff_ms = None;
        self.last_chuff_interval_ms = None;
    }

    fn speed_changed<P: SoundPlayer>(&mut self, now_ms: u64, player: &mut P) {
        if self.speed_history.is_full() {
            self.speed_history.pop_front();
        }
        let _ = self.speed_history.push_back((now_ms, self.speed));
        debug!(address = self.address, speed = self.speed, "speed changed");

        let Some(interval) = self.chuff.interval_ms(self.speed) else {
            self.clear_schedule();
            if self.sound.brake_on_stop {
                self.play(player, Sound::Brakes);
            }
            return;
        };

        self.pending = None;
        let (last_ms, last_interval) = match (self.last_chuff_ms, self.last_chuff_interval_ms) {
            (Some(last_ms), Some(last_interval)) => (last_ms, last_interval),
            _ => {
                info!(address = self.address, speed = self.speed, "starting");
                self.play(player, Sound::Start);
                self.play_chuff(player);
                self.last_chuff_ms = Some(now_ms);
                self.last_chuff_interval_ms = Some(interval);
                (now_ms, interval)
            }
        };

        self.schedule_chuff(last_ms + (interval + last_interval) / 2);
    }

    fn chuff_due<P: SoundPlayer>(&mut self, now_ms: u64, player: &mut P) {
        let Some(interval) = self.chuff.interval_ms(self.speed) else {
            return;
        };
        self.play_chuff(player);
        self.last_chuff_ms = Some(now_ms);
        self.last_chuff_interval_ms = Some(interval);
        self.schedule_chuff(now_ms + interval);
    }

    fn schedule_chuff(&mut self, due_ms: u64) {
        trace!(address = self.address, due_ms, "chuff scheduled");
        self.pending = Some(Scheduled {
            due_ms,
            action: ScheduledAction::Chuff,
        });
    }

    fn play_chuff<P: SoundPlayer>(&mut self, player: &mut P) {
        let cylinder = self.next_cylinder;
        self.next_cylinder = (cylinder + 1) % self.sound.cylinders.max(1);
        self.play(player, Sound::Cylinder(cylinder));
    }

    fn play<P: SoundPlayer>(&self, player: &mut P, sound: Sound) {
        let id = self.sound_id(sound);
        if let Err(error) = player.play_once(id) {
            warn!(%id, ?error, "playback failed");
        }
    }

    fn sound_id(&self, sound: Sound) -> SoundId {
        SoundId::new(self.address, sound)
    }
}
