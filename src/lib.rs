//! # loco-sound
//!
//! Steam locomotive sound simulation driven by the status broadcasts of a
//! Roco/Fleischmann Z21 digital command station.
//!
//! ## Features
//!
//! - **Wire codec**: Z21 UDP frames with extended header and XOR checksum
//! - **Status decoding**: address, speed step mode, speed, direction and functions F0–F68
//! - **Chuff scheduling**: speed-paced cylinder sounds with smooth tempo changes
//! - **Function reactions**: ambient loop (F6), horn (F7), idle loop (F9) plus custom observers
//! - **Session handling**: login, keep-alive, subscription and logoff
//!
//! ## Architecture
//!
//! The crate is structured to allow testing without a station or speakers:
//!
//! - `frame` - Frame codec and request builders
//! - `status` - Locomotive status decoder
//! - `engine` - Per-locomotive state and chuff scheduler
//! - `collector` - Engine registry, dispatch and tick loop
//! - `client` - Z21 session over a datagram transport
//! - `traits` - Sound, transport and clock abstractions
//! - `hal` - Concrete implementations (mocks for testing, UDP for the real station)
//!
//! ## Example
//!
//! ```rust
//! use loco_sound::{Collector, Frame, LocoStatus, hal::MockPlayer};
//!
//! let mut collector = Collector::new(MockPlayer::new());
//! collector.register(232);
//!
//! // Loco 232 at speed 30 on 126 steps, forward, F6 on
//! let bytes = [
//!     0x0E, 0x00, 0x40, 0x00, 0xEF, 0x00, 0xE8, 0x04, 0x9F, 0x00, 0x02, 0x00, 0x00, 0x00,
//! ];
//! let frame = Frame::parse(&bytes).unwrap();
//! let status = LocoStatus::decode(&frame).unwrap();
//! assert_eq!(status.speed, 30);
//!
//! collector.dispatch(&status, 0);
//!
//! // Call tick() from your main loop; the next chuff is due 359 ms later
//! assert_eq!(collector.tick(358), 0);
//! assert_eq!(collector.tick(359), 1);
//! ```

#![warn(missing_docs)]

/// Z21 session client: login, keep-alive, subscription and logoff.
pub mod client;
/// Engine registry that routes status reports and fires scheduled chuffs.
pub mod collector;
/// Configuration for the station session, sounds and chuff timing.
pub mod config;
/// Per-locomotive state engine and chuff scheduler.
pub mod engine;
/// Error types for frame decoding.
pub mod error;
/// Z21 frame codec.
pub mod frame;
/// Built-in function reactions and function observers.
pub mod functions;
/// Concrete collaborators with mock implementations for testing.
pub mod hal;
/// Locomotive status decoder.
pub mod status;
/// Collaborator traits for audio, network and time.
pub mod traits;

// Re-exports for convenience
pub use client::Z21Client;
pub use collector::Collector;
pub use config::{ChuffProfile, Config, SoundConfig, Z21Config};
pub use engine::{LocoEngine, Scheduled, ScheduledAction};
pub use error::{Error, Result};
pub use frame::Frame;
pub use functions::{FunctionChange, FunctionReaction};
pub use status::{Direction, FunctionMap, LocoStatus, SpeedStepMode};
pub use traits::{Clock, Sound, SoundId, SoundPlayer, Transport};
