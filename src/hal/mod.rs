//! Collaborator implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles recording every call
//! - `desktop`: UDP socket, `Instant` clock and a logging sound player

pub mod desktop;
pub mod mock;

pub use desktop::*;
pub use mock::*;
