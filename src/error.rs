//! Error types for frame decoding.

use thiserror::Error;

/// Errors raised by the codec and the status decoder.
///
/// None of these are fatal to the process. A caller polling the command
/// station logs the error, drops the offending datagram and keeps going.
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer too short to hold even the length and header fields.
    #[error("malformed frame: {len} bytes (need at least {min})", min = crate::frame::MIN_FRAME_LEN)]
    MalformedFrame {
        /// Buffer length received
        len: usize,
    },

    /// Frame is not a locomotive status report.
    #[error("unexpected frame type: header {header:02x?}, x-header {x_header:?}")]
    UnexpectedFrameType {
        /// Header bytes found
        header: [u8; 2],
        /// Extended header found, if any
        x_header: Option<u8>,
    },

    /// Status frame without the mandatory address/mode/speed bytes.
    #[error("truncated status payload: need {needed} bytes, got {got}")]
    TruncatedStatus {
        /// Minimum payload length
        needed: usize,
        /// Actual payload length
        got: usize,
    },

    /// Attempt to build a frame carrying data without an extended header.
    #[error("payload of {len} bytes requires an extended header")]
    PayloadWithoutExtendedHeader {
        /// Payload length
        len: usize,
    },
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;
