//! Z21 session client.
//!
//! Wraps a [`Transport`] with the session requests a listener needs:
//! login, keep-alive, broadcast subscription and logoff. The station drops
//! clients that stay silent, so [`Z21Client::poll`] re-sends the login
//! request once the keep-alive period has elapsed.
//!
//! # Example
//!
//! ```rust
//! use loco_sound::{Frame, Z21Client};
//! use loco_sound::config::Z21Config;
//! use loco_sound::hal::MockTransport;
//!
//! let mut client = Z21Client::new(MockTransport::new(), &Z21Config::default());
//! client.login(0).unwrap();
//! client.subscribe_all_locos().unwrap();
//!
//! client
//!     .transport_mut()
//!     .queue_frame(&Frame::with_payload([0x40, 0x00], 0xEF, [0x00, 0x03, 0x04, 0x80]));
//! let frame = client.poll(10).unwrap().unwrap();
//! assert_eq!(frame.x_header(), Some(0xEF));
//! ```

use tracing::{debug, info, warn};

use crate::config::Z21Config;
use crate::frame::Frame;
use crate::traits::Transport;

/// Session with one command station.
///
/// Sends a logoff request when dropped while logged in.
#[derive(Debug)]
pub struct Z21Client<T: Transport> {
    transport: T,
    keep_alive_ms: u64,
    last_login_ms: Option<u64>,
}

impl<T: Transport> Z21Client<T> {
    /// Wrap a transport. Nothing is sent until [`login`](Self::login).
    pub fn new(transport: T, config: &Z21Config) -> Self {
        Self {
            transport,
            keep_alive_ms: config.keep_alive_ms(),
            last_login_ms: None,
        }
    }

    /// True between [`login`](Self::login) and [`logoff`](Self::logoff).
    pub fn is_logged_in(&self) -> bool {
        self.last_login_ms.is_some()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Announce this client by requesting the serial number.
    pub fn login(&mut self, now_ms: u64) -> Result<(), T::Error> {
        self.send(&Frame::get_serial())?;
        if self.last_login_ms.is_none() {
            info!("logged in");
        }
        self.last_login_ms = Some(now_ms);
        Ok(())
    }

    /// Re-send the login request if the keep-alive period has elapsed.
    ///
    /// Returns `true` if a request was sent. Does nothing while logged off.
    pub fn keep_alive(&mut self, now_ms: u64) -> Result<bool, T::Error> {
        match self.last_login_ms {
            Some(last) if now_ms.saturating_sub(last) >= self.keep_alive_ms => {
                debug!(now_ms, "keep-alive");
                self.login(now_ms)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Subscribe to status reports of every locomotive.
    pub fn subscribe_all_locos(&mut self) -> Result<(), T::Error> {
        info!("subscribing to all locomotives");
        self.send(&Frame::subscribe_all_locos())
    }

    /// Request status reports for one locomotive.
    pub fn subscribe_loco(&mut self, address: u16) -> Result<(), T::Error> {
        info!(address, "subscribing to locomotive");
        self.send(&Frame::subscribe_loco(address))
    }

    /// End the session.
    pub fn logoff(&mut self) -> Result<(), T::Error> {
        self.last_login_ms = None;
        info!("logging off");
        self.send(&Frame::logoff())
    }

    /// Keep the session alive and receive at most one frame.
    ///
    /// Datagrams that do not parse are logged and dropped. Frames with a
    /// bad checksum are logged and still returned.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<Frame>, T::Error> {
        self.keep_alive(now_ms)?;

        let Some(bytes) = self.transport.try_receive()? else {
            return Ok(None);
        };
        match Frame::parse(&bytes) {
            Ok(frame) => {
                debug!(%frame, "received");
                if !frame.checksum_valid() {
                    warn!(
                        %frame,
                        expected = ?frame.computed_checksum(),
                        "checksum mismatch"
                    );
                }
                Ok(Some(frame))
            }
            Err(error) => {
                warn!(%error, len = bytes.len(), "dropping datagram");
                Ok(None)
            }
        }
    }

    fn send(&mut self, frame: &Frame) -> Result<(), T::Error> {
        debug!(%frame, "sending");
        self.transport.send(&frame.serialize())
    }
}

impl<T: Transport> Drop for Z21Client<T> {
    fn drop(&mut self) {
        if self.is_logged_in() {
            if let Err(error) = self.logoff() {
                warn!(?error, "logoff on drop failed");
            }
        }
    }
}
