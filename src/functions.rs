//! Function button reactions.
//!
//! When a function bit changes, the engine first runs the built-in
//! [`FunctionReaction`] for that index (if any), then every observer bound
//! to the index through [`Observers`].
//!
//! | Function | Built-in reaction |
//! |----------|-------------------|
//! | F6 | start/stop the running ambience loop |
//! | F7 | play the horn once |
//! | F9 | start/stop the idle ambience loop |
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use loco_sound::functions::{FunctionChange, Observers};
//! use loco_sound::FunctionMap;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let mut observers = Observers::new();
//! observers.bind(2, move |change: &FunctionChange<'_>| {
//!     sink.lock().unwrap().push(change.new_value);
//! });
//!
//! let functions = FunctionMap::from([(2, true)]);
//! observers.notify(&FunctionChange { index: 2, new_value: true, old_value: false, functions: &functions });
//! assert_eq!(*seen.lock().unwrap(), vec![true]);
//! ```

use core::fmt;
use std::collections::BTreeMap;

use crate::status::FunctionMap;
use crate::traits::{Sound, SoundId, SoundPlayer};

/// Built-in reaction to a function change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionReaction {
    /// Loop the sound while the function is on.
    ToggleLoop(Sound),
    /// Play the sound once on every change.
    PlayOnce(Sound),
}

impl FunctionReaction {
    /// Reaction for a function index, if it has one.
    pub const fn builtin(index: u16) -> Option<Self> {
        match index {
            6 => Some(FunctionReaction::ToggleLoop(Sound::Ambient)),
            7 => Some(FunctionReaction::PlayOnce(Sound::Horn)),
            9 => Some(FunctionReaction::ToggleLoop(Sound::Idle)),
            _ => None,
        }
    }

    /// Sound driven by this reaction.
    pub const fn sound(&self) -> Sound {
        match self {
            FunctionReaction::ToggleLoop(sound) | FunctionReaction::PlayOnce(sound) => *sound,
        }
    }

    /// Run the reaction for `address` after the function switched to `new_value`.
    pub fn run<P: SoundPlayer>(
        &self,
        address: u16,
        new_value: bool,
        player: &mut P,
    ) -> Result<(), P::Error> {
        let id = SoundId::new(address, self.sound());
        match self {
            FunctionReaction::ToggleLoop(_) if new_value => player.play_loop(id),
            FunctionReaction::ToggleLoop(_) => player.stop_loop(id),
            FunctionReaction::PlayOnce(_) => player.play_once(id),
        }
    }
}

/// A function value change, as seen by observers.
#[derive(Clone, Copy, Debug)]
pub struct FunctionChange<'a> {
    /// Function index.
    pub index: u16,
    /// Value after the change.
    pub new_value: bool,
    /// Value before the change.
    pub old_value: bool,
    /// All functions of the status report that caused the change.
    pub functions: &'a FunctionMap,
}

/// Observer callback bound to a function index.
pub type Observer = Box<dyn FnMut(&FunctionChange<'_>) + Send>;

/// Observers per function index, called in binding order.
#[derive(Default)]
pub struct Observers {
    by_index: BTreeMap<u16, Vec<Observer>>,
}

impl Observers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an observer to a function index.
    pub fn bind<F>(&mut self, index: u16, observer: F)
    where
        F: FnMut(&FunctionChange<'_>) + Send + 'static,
    {
        self.by_index
            .entry(index)
            .or_default()
            .push(Box::new(observer));
    }

    /// Call every observer bound to `change.index`.
    pub fn notify(&mut self, change: &FunctionChange<'_>) {
        if let Some(observers) = self.by_index.get_mut(&change.index) {
            for observer in observers.iter_mut() {
                observer(change);
            }
        }
    }

    /// Number of observers bound to an index.
    pub fn count(&self, index: u16) -> usize {
        self.by_index.get(&index).map_or(0, Vec::len)
    }

    /// Drop every observer bound to an index.
    pub fn clear(&mut self, index: u16) {
        self.by_index.remove(&index);
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.by_index.iter().map(|(index, v)| (index, v.len())))
            .finish()
    }
}
