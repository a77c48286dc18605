//! Z21 LAN frame codec.
//!
//! Every datagram exchanged with the command station has the same outer
//! shape:
//!
//! ```text
//! offset 0..2    length           (u16 LE, informational)
//! offset 2..4    header           (message class)
//! offset 4       x-header         (present on X-bus style frames)
//! offset 5..N-1  payload          (0..n bytes)
//! offset N-1     checksum         (XOR of x-header and payload)
//! ```
//!
//! The declared length is never checked against the buffer size; the
//! station is trusted to send complete datagrams and short reads are
//! rejected only when the header itself is missing.
//!
//! # Example
//!
//! ```rust
//! use loco_sound::Frame;
//!
//! let frame = Frame::subscribe_loco(3);
//! let bytes = frame.serialize();
//! assert_eq!(bytes, [0x09, 0x00, 0x40, 0x00, 0xE3, 0xF0, 0x00, 0x03, 0x10]);
//!
//! let parsed = Frame::parse(&bytes).unwrap();
//! assert_eq!(parsed.header(), [0x40, 0x00]);
//! assert!(parsed.checksum_valid());
//! ```

use core::fmt;

use crate::error::{Error, Result};

/// Minimum datagram size accepted by [`Frame::parse`].
pub const MIN_FRAME_LEN: usize = 5;

/// Size of the little-endian length prefix.
pub const LENGTH_FIELD_LEN: usize = 2;

/// Known message-class headers.
pub mod header {
    /// X-bus tunnel (loco info requests and reports).
    pub const X_BUS: [u8; 2] = [0x40, 0x00];
    /// Client log off.
    pub const LOGOFF: [u8; 2] = [0x30, 0x00];
    /// Serial number request, doubles as login / keep-alive.
    pub const GET_SERIAL: [u8; 2] = [0x10, 0x01];
    /// Broadcast subscription flags.
    pub const BROADCAST_FLAGS: [u8; 2] = [0x50, 0x00];
}

/// Known X-bus extended headers.
pub mod x_header {
    /// Locomotive status report sent by the station.
    pub const LOCO_INFO: u8 = 0xEF;
    /// Locomotive status request sent by a client.
    pub const GET_LOCO_INFO: u8 = 0xE3;
    /// Extended header of the broadcast subscription request.
    pub const BROADCAST: u8 = 0x00;
}

/// XOR fold of the extended header followed by every payload byte.
#[inline]
pub fn checksum(x_header: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(x_header, |acc, b| acc ^ b)
}

/// A parsed or to-be-sent Z21 datagram.
///
/// Equality compares header, extended header, payload and effective
/// [`checksum`](Self::checksum). The informational length field is ignored,
/// so a parsed frame equals the frame it was serialized from.
#[derive(Clone, Debug)]
pub struct Frame {
    length: Option<u16>,
    header: [u8; 2],
    x_header: Option<u8>,
    payload: Vec<u8>,
    checksum: Option<u8>,
}

impl Frame {
    /// Header-only frame (no extended header, no checksum).
    pub fn new(header: [u8; 2]) -> Self {
        Self {
            length: None,
            header,
            x_header: None,
            payload: Vec::new(),
            checksum: None,
        }
    }

    /// Frame with an extended header and payload; checksum is computed.
    pub fn with_payload(header: [u8; 2], x_header: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            length: None,
            header,
            x_header: Some(x_header),
            payload: payload.into(),
            checksum: None,
        }
    }

    /// Build a frame from its raw parts.
    ///
    /// Fails with [`Error::PayloadWithoutExtendedHeader`] if `payload` is
    /// non-empty and `x_header` is `None`. A supplied `checksum` is sent as
    /// is, even if it does not match the computed fold.
    pub fn try_new(
        header: [u8; 2],
        x_header: Option<u8>,
        payload: Vec<u8>,
        checksum: Option<u8>,
    ) -> Result<Self> {
        if x_header.is_none() && !payload.is_empty() {
            return Err(Error::PayloadWithoutExtendedHeader { len: payload.len() });
        }
        Ok(Self {
            length: None,
            header,
            x_header,
            payload,
            checksum: checksum.filter(|_| x_header.is_some()),
        })
    }

    /// Parse a received datagram.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedFrame`] if `bytes` is shorter than
    /// [`MIN_FRAME_LEN`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let len = bytes.len();
        if len < MIN_FRAME_LEN {
            return Err(Error::MalformedFrame { len });
        }

        // A 5 byte frame shares its last byte between x-header and checksum.
        let payload = if len > MIN_FRAME_LEN + 1 {
            bytes[MIN_FRAME_LEN..len - 1].to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            length: Some(u16::from_le_bytes([bytes[0], bytes[1]])),
            header: [bytes[2], bytes[3]],
            x_header: Some(bytes[4]),
            payload,
            checksum: Some(bytes[len - 1]),
        })
    }

    /// Serialize to wire bytes, prefixed with the computed length.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.header.len() + self.payload.len() + 2);
        body.extend_from_slice(&self.header);
        if let Some(x) = self.x_header {
            body.push(x);
            body.extend_from_slice(&self.payload);
            body.push(self.checksum.unwrap_or_else(|| checksum(x, &self.payload)));
        }

        let length = (body.len() + LENGTH_FIELD_LEN) as u16;
        let mut bytes = Vec::with_capacity(body.len() + LENGTH_FIELD_LEN);
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Declared length, for parsed frames.
    pub fn length(&self) -> Option<u16> {
        self.length
    }

    /// Message class header.
    pub fn header(&self) -> [u8; 2] {
        self.header
    }

    /// Extended header, if present.
    pub fn x_header(&self) -> Option<u8> {
        self.x_header
    }

    /// Payload bytes between the extended header and the checksum.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checksum as received or supplied, otherwise computed.
    pub fn checksum(&self) -> Option<u8> {
        self.checksum.or_else(|| self.computed_checksum())
    }

    /// Checksum computed from the extended header and payload.
    pub fn computed_checksum(&self) -> Option<u8> {
        self.x_header.map(|x| checksum(x, &self.payload))
    }

    /// True if the carried checksum matches the computed fold.
    ///
    /// Frames without an extended header carry no checksum and are
    /// always valid.
    pub fn checksum_valid(&self) -> bool {
        self.checksum() == self.computed_checksum()
    }

    /// True if header and extended header match.
    pub fn is(&self, header: [u8; 2], x_header: u8) -> bool {
        self.header == header && self.x_header == Some(x_header)
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// `LAN_LOGOFF`: tell the station to forget this client.
    pub fn logoff() -> Self {
        Self::new(header::LOGOFF)
    }

    /// Serial number request, used as login and keep-alive.
    pub fn get_serial() -> Self {
        Self::new(header::GET_SERIAL)
    }

    /// Subscribe to status broadcasts for every locomotive.
    ///
    /// Sent as `09 00 50 00 00 01 00 01 00`: the `0x00` extended header is
    /// kept on the wire. Clients that drop a zero extended header send
    /// `07 00 50 00 01 00 01` instead, which reads as the little-endian
    /// flags `0x00010001`. Which of the two a real station accepts has not
    /// been verified.
    pub fn subscribe_all_locos() -> Self {
        Self::with_payload(
            header::BROADCAST_FLAGS,
            x_header::BROADCAST,
            [0x01, 0x00, 0x01],
        )
    }

    /// Request status for (and subscribe to) a single locomotive.
    pub fn subscribe_loco(address: u16) -> Self {
        let [msb, lsb] = address.to_be_bytes();
        Self::with_payload(header::X_BUS, x_header::GET_LOCO_INFO, [0xF0, msb, lsb])
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.x_header == other.x_header
            && self.payload == other.payload
            && self.checksum() == other.checksum()
    }
}

impl Eq for Frame {}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "0x{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z21 frame - header: {}", Hex(&self.header))?;
        match self.x_header {
            Some(x) => write!(f, " - x-header: 0x{x:02x}")?,
            None => f.write_str(" - x-header: not set")?,
        }
        write!(
            f,
            " - payload: {} - raw: {}",
            Hex(&self.payload),
            Hex(&self.serialize())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_rejects_short_buffers() {
        for len in 0..MIN_FRAME_LEN {
            let bytes = vec![0u8; len];
            assert!(matches!(
                Frame::parse(&bytes),
                Err(Error::MalformedFrame { len: l }) if l == len
            ));
        }
    }

    #[test]
    fn parse_five_bytes_shares_checksum_byte() {
        let frame = Frame::parse(&[0x05, 0x00, 0x10, 0x01, 0x7A]).unwrap();
        assert_eq!(frame.header(), [0x10, 0x01]);
        assert_eq!(frame.x_header(), Some(0x7A));
        assert_eq!(frame.checksum(), Some(0x7A));
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn parse_six_bytes_has_empty_payload() {
        let frame = Frame::parse(&[0x06, 0x00, 0x40, 0x00, 0x61, 0x61]).unwrap();
        assert_eq!(frame.x_header(), Some(0x61));
        assert_eq!(frame.checksum(), Some(0x61));
        assert!(frame.payload().is_empty());
        assert!(frame.checksum_valid());
    }

    #[test]
    fn parse_extracts_payload() {
        let bytes = [0x09, 0x00, 0x40, 0x00, 0xE3, 0xF0, 0x00, 0x03, 0x10];
        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.length(), Some(9));
        assert_eq!(frame.header(), header::X_BUS);
        assert_eq!(frame.x_header(), Some(x_header::GET_LOCO_INFO));
        assert_eq!(frame.payload(), &[0xF0, 0x00, 0x03]);
        assert!(frame.checksum_valid());
    }

    #[test]
    fn parse_tolerates_length_mismatch() {
        let bytes = [0xFF, 0x00, 0x40, 0x00, 0xE3, 0xF0, 0x00, 0x03, 0x10];
        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.length(), Some(0xFF));
        assert_eq!(frame.payload().len(), 3);
    }

    #[test]
    fn parse_keeps_bad_checksum() {
        let bytes = [0x09, 0x00, 0x40, 0x00, 0xE3, 0xF0, 0x00, 0x03, 0x11];
        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.checksum(), Some(0x11));
        assert_eq!(frame.computed_checksum(), Some(0x10));
        assert!(!frame.checksum_valid());
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn payload_without_x_header_is_rejected() {
        let result = Frame::try_new([0x40, 0x00], None, vec![0x01], None);
        assert!(matches!(
            result,
            Err(Error::PayloadWithoutExtendedHeader { len: 1 })
        ));
    }

    #[test]
    fn header_only_frame_is_accepted() {
        let frame = Frame::try_new([0x30, 0x00], None, Vec::new(), None).unwrap();
        assert_eq!(frame.x_header(), None);
        assert_eq!(frame.checksum(), None);
        assert!(frame.checksum_valid());
    }

    #[test]
    fn supplied_checksum_is_sent_verbatim() {
        let frame = Frame::try_new([0x40, 0x00], Some(0xE3), vec![0xF0], Some(0xAA)).unwrap();
        let bytes = frame.serialize();
        assert_eq!(bytes.last(), Some(&0xAA));
        assert!(!frame.checksum_valid());
    }

    #[test]
    fn supplied_zero_checksum_is_not_recomputed() {
        let frame = Frame::try_new([0x40, 0x00], Some(0xE3), vec![0xF0], Some(0x00)).unwrap();
        assert_eq!(frame.serialize().last(), Some(&0x00));
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn serialize_logoff() {
        assert_eq!(Frame::logoff().serialize(), [0x04, 0x00, 0x30, 0x00]);
    }

    #[test]
    fn serialize_get_serial() {
        assert_eq!(Frame::get_serial().serialize(), [0x04, 0x00, 0x10, 0x01]);
    }

    #[test]
    fn serialize_subscribe_all_keeps_zero_x_header() {
        assert_eq!(
            Frame::subscribe_all_locos().serialize(),
            [0x09, 0x00, 0x50, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn serialize_subscribe_loco_splits_address() {
        let bytes = Frame::subscribe_loco(0x1234).serialize();
        assert_eq!(&bytes[4..8], &[0xE3, 0xF0, 0x12, 0x34]);
        assert_eq!(bytes[8], 0xE3 ^ 0xF0 ^ 0x12 ^ 0x34);
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]) as usize, bytes.len());
    }

    #[test]
    fn checksum_of_empty_payload_is_x_header() {
        assert_eq!(checksum(0xEF, &[]), 0xEF);
    }

    #[test]
    fn parsed_frame_equals_built_frame() {
        let built = Frame::subscribe_loco(3);
        let parsed = Frame::parse(&built.serialize()).unwrap();
        assert_eq!(parsed.length(), Some(9));
        assert_eq!(built.length(), None);
        assert_eq!(parsed, built);

        let tampered = Frame::try_new(header::X_BUS, Some(0xE3), vec![0xF0, 0x00, 0x03], Some(0x11));
        assert_ne!(parsed, tampered.unwrap());
    }

    #[test]
    fn display_shows_hex() {
        let text = Frame::subscribe_loco(3).to_string();
        assert!(text.contains("header: 0x40 0x00"));
        assert!(text.contains("x-header: 0xe3"));
        assert!(text.contains("payload: 0xf0 0x00 0x03"));
    }

    // =========================================================================
    // Properties
    // =========================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_roundtrip_preserves_fields(
                hdr in any::<[u8; 2]>(),
                x in any::<u8>(),
                payload in prop::collection::vec(any::<u8>(), 0..64),
            ) {
                let frame = Frame::with_payload(hdr, x, payload.clone());
                let bytes = frame.serialize();
                let parsed = Frame::parse(&bytes).unwrap();

                prop_assert_eq!(parsed.header(), hdr);
                prop_assert_eq!(parsed.x_header(), Some(x));
                prop_assert_eq!(parsed.payload(), payload.as_slice());
                prop_assert!(parsed.checksum_valid());
                prop_assert_eq!(parsed.length(), Some(bytes.len() as u16));
            }

            #[test]
            fn prop_checksum_is_xor_fold(
                x in any::<u8>(),
                payload in prop::collection::vec(any::<u8>(), 0..64),
            ) {
                let mut expected = x;
                for b in &payload {
                    expected ^= *b;
                }
                prop_assert_eq!(checksum(x, &payload), expected);
            }
        }
    }
}
