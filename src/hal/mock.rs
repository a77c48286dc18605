//! Mock implementations for testing without a command station or speakers.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPlayer`] | [`SoundPlayer`] | Records every playback call |
//! | [`MockTransport`] | [`Transport`] | Captures sent datagrams, replays queued ones |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use loco_sound::{Collector, LocoStatus, Frame};
//! use loco_sound::hal::MockPlayer;
//! use loco_sound::traits::{Sound, SoundId};
//!
//! let mut collector = Collector::new(MockPlayer::new());
//! collector.register(3);
//!
//! // Speed 10 on 126 steps, forward
//! let frame = Frame::with_payload([0x40, 0x00], 0xEF, [0x00, 0x03, 0x04, 0x8B]);
//! collector.dispatch(&LocoStatus::decode(&frame).unwrap(), 0);
//!
//! let player = collector.player();
//! assert_eq!(player.played_once(SoundId::new(3, Sound::Start)), 1);
//! ```
//!
//! [`SoundPlayer`]: crate::traits::SoundPlayer
//! [`Transport`]: crate::traits::Transport
//! [`Clock`]: crate::traits::Clock

use std::collections::{BTreeSet, VecDeque};

use crate::frame::Frame;
use crate::traits::{Clock, SoundId, SoundPlayer, Transport};

// ============================================================================
// Audio Mock
// ============================================================================

/// One recorded [`SoundPlayer`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCall {
    /// `play_once`
    PlayOnce(SoundId),
    /// `play_loop`
    PlayLoop(SoundId),
    /// `stop_loop`
    StopLoop(SoundId),
    /// `set_volume`
    SetVolume(SoundId, f32),
}

/// Mock sound player.
///
/// Records all calls in order. Set `fail` to make every call return
/// `Err(())` (calls are still recorded).
#[derive(Debug, Default)]
pub struct MockPlayer {
    /// Every call, in order.
    pub calls: Vec<PlayerCall>,
    /// Sounds currently looping.
    pub looping: BTreeSet<SoundId>,
    /// Fail every call.
    pub fail: bool,
}

impl MockPlayer {
    /// Creates a new mock player.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock player whose calls all fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `play_once` calls for a sound.
    pub fn played_once(&self, id: SoundId) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == PlayerCall::PlayOnce(id))
            .count()
    }

    /// True if the sound is looping.
    pub fn is_looping(&self, id: SoundId) -> bool {
        self.looping.contains(&id)
    }

    /// Last volume set for a sound.
    pub fn volume(&self, id: SoundId) -> Option<f32> {
        self.calls.iter().rev().find_map(|call| match call {
            PlayerCall::SetVolume(target, level) if *target == id => Some(*level),
            _ => None,
        })
    }

    /// Forget recorded calls (looping state is kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: PlayerCall) -> Result<(), ()> {
        self.calls.push(call);
        if self.fail {
            Err(())
        } else {
            Ok(())
        }
    }
}

impl SoundPlayer for MockPlayer {
    type Error = ();

    fn play_once(&mut self, id: SoundId) -> Result<(), ()> {
        self.record(PlayerCall::PlayOnce(id))
    }

    fn play_loop(&mut self, id: SoundId) -> Result<(), ()> {
        self.looping.insert(id);
        self.record(PlayerCall::PlayLoop(id))
    }

    fn stop_loop(&mut self, id: SoundId) -> Result<(), ()> {
        self.looping.remove(&id);
        self.record(PlayerCall::StopLoop(id))
    }

    fn set_volume(&mut self, id: SoundId, level: f32) -> Result<(), ()> {
        self.record(PlayerCall::SetVolume(id, level))
    }
}

// ============================================================================
// Transport Mock
// ============================================================================

/// Mock datagram transport.
///
/// Datagrams queued with [`queue_datagram`](Self::queue_datagram) come out
/// of `try_receive` in FIFO order.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Datagrams sent, in order.
    pub sent: Vec<Vec<u8>>,
    /// Datagrams waiting to be received.
    pub incoming: VecDeque<Vec<u8>>,
    /// Fail every send.
    pub fail_send: bool,
}

impl MockTransport {
    /// Creates an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw datagram for reception.
    pub fn queue_datagram(&mut self, datagram: impl Into<Vec<u8>>) {
        self.incoming.push_back(datagram.into());
    }

    /// Queue a frame for reception.
    pub fn queue_frame(&mut self, frame: &Frame) {
        self.queue_datagram(frame.serialize());
    }

    /// Sent datagrams parsed back into frames.
    ///
    /// Header-only requests are too short for [`Frame::parse`] and are
    /// rebuilt from their header bytes instead.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.sent
            .iter()
            .filter_map(|bytes| match bytes.as_slice() {
                [_, _, a, b] => Some(Frame::new([*a, *b])),
                other => Frame::parse(other).ok(),
            })
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn send(&mut self, datagram: &[u8]) -> Result<(), ()> {
        if self.fail_send {
            return Err(());
        }
        self.sent.push(datagram.to_vec());
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ()> {
        Ok(self.incoming.pop_front())
    }
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for testing.
///
/// Time only moves when [`set`](Self::set) or [`advance`](Self::advance)
/// is called.
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: u64,
}

impl MockClock {
    /// Creates a clock at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set absolute time
    pub fn set(&mut self, ms: u64) {
        self.now_ms = ms;
    }

    /// Advance time by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
