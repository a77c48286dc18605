//! Locomotive status decoding.
//!
//! Decodes `LAN_X_LOCO_INFO` reports (header `40 00`, x-header `EF`) into a
//! [`LocoStatus`]. Payload layout:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | address MSB (lower 6 bits) |
//! | 1 | address LSB |
//! | 2 | speed step selector (lower 3 bits) |
//! | 3 | direction (bit 7) and speed magnitude (bits 0-6) |
//! | 4 | F0 (bit 4), F4 (bit 3), F3 (bit 2), F2 (bit 1), F1 (bit 0) |
//! | 5.. | eight functions per byte, starting at F5, LSB first |
//!
//! # Example
//!
//! ```rust
//! use loco_sound::{Frame, LocoStatus, SpeedStepMode, Direction};
//!
//! let frame = Frame::with_payload([0x40, 0x00], 0xEF, [0x00, 0x03, 0x04, 0x85, 0x10]);
//! let status = LocoStatus::decode(&frame).unwrap();
//!
//! assert_eq!(status.address, 3);
//! assert_eq!(status.speed_step_mode, SpeedStepMode::HundredTwentySixStep);
//! assert_eq!(status.speed, 4);
//! assert_eq!(status.direction, Direction::Forward);
//! assert_eq!(status.functions.get(&0), Some(&true));
//! ```

use core::fmt;
use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::frame::{header, x_header, Frame};

/// Sparse map of function index to on/off state.
pub type FunctionMap = BTreeMap<u16, bool>;

/// Address, speed step and speed bytes every status report carries.
pub const STATUS_MIN_PAYLOAD: usize = 4;

/// Index of the first function carried by the extended function bytes.
const FIRST_EXTENDED_FUNCTION: u16 = 5;

/// F0..F4 bit positions in payload byte 4, as (function, mask).
const LEGACY_FUNCTION_BITS: [(u16, u8); 5] = [
    (0, 0b0001_0000),
    (4, 0b0000_1000),
    (3, 0b0000_0100),
    (2, 0b0000_0010),
    (1, 0b0000_0001),
];

/// Direction of travel reported by the station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Driving forward.
    #[default]
    Forward,
    /// Driving backward.
    Backward,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    /// Direction from bit 7 of the speed byte (set = forward).
    #[inline]
    pub const fn from_speed_byte(byte: u8) -> Self {
        if byte & 0x80 != 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

/// DCC speed step resolution of a locomotive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedStepMode {
    /// 14 speed steps.
    FourteenStep,
    /// 28 speed steps.
    TwentyEightStep,
    /// 126 speed steps.
    HundredTwentySixStep,
    /// Selector value the decoder does not understand.
    Unknown(u8),
}

impl SpeedStepMode {
    /// Mode from the lower three bits of payload byte 2.
    pub const fn from_selector(byte: u8) -> Self {
        match byte & 0b0000_0111 {
            1 => SpeedStepMode::FourteenStep,
            2 => SpeedStepMode::TwentyEightStep,
            4 => SpeedStepMode::HundredTwentySixStep,
            other => SpeedStepMode::Unknown(other),
        }
    }

    /// Number of discrete steps, if known.
    pub const fn steps(&self) -> Option<u8> {
        match self {
            SpeedStepMode::FourteenStep => Some(14),
            SpeedStepMode::TwentyEightStep => Some(28),
            SpeedStepMode::HundredTwentySixStep => Some(126),
            SpeedStepMode::Unknown(_) => None,
        }
    }

    /// Normalized speed (0 = stopped) from the 7-bit magnitude.
    pub fn speed(&self, magnitude: u8) -> u16 {
        let magnitude = u16::from(magnitude & 0b0111_1111);
        match self {
            SpeedStepMode::FourteenStep | SpeedStepMode::HundredTwentySixStep => {
                magnitude.saturating_sub(1)
            }
            // The intermediate step bit (bit 4) is ignored; only even steps are reported.
            SpeedStepMode::TwentyEightStep => 2 * (magnitude & 0b0000_1111).saturating_sub(1),
            SpeedStepMode::Unknown(_) => 0,
        }
    }
}

/// Decoded locomotive status report.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocoStatus {
    /// Locomotive address (14 bits).
    pub address: u16,
    /// Speed step resolution.
    pub speed_step_mode: SpeedStepMode,
    /// Normalized speed, 0 = stopped.
    pub speed: u16,
    /// Driving direction.
    pub direction: Direction,
    /// Function states carried by the report.
    pub functions: FunctionMap,
}

impl LocoStatus {
    /// Decode a status report.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedFrameType`] if the frame is not a loco info report
    /// - [`Error::TruncatedStatus`] if the payload misses address or speed bytes
    pub fn decode(frame: &Frame) -> Result<Self> {
        if !frame.is(header::X_BUS, x_header::LOCO_INFO) {
            return Err(Error::UnexpectedFrameType {
                header: frame.header(),
                x_header: frame.x_header(),
            });
        }

        let data = frame.payload();
        if data.len() < STATUS_MIN_PAYLOAD {
            return Err(Error::TruncatedStatus {
                needed: STATUS_MIN_PAYLOAD,
                got: data.len(),
            });
        }

        let address = (u16::from(data[0] & 0x3F) << 8) | u16::from(data[1]);
        let speed_step_mode = SpeedStepMode::from_selector(data[2]);
        if let SpeedStepMode::Unknown(selector) = speed_step_mode {
            warn!(address, selector, byte = data[2], "unknown speed step mode");
        }

        Ok(Self {
            address,
            speed_step_mode,
            speed: speed_step_mode.speed(data[3]),
            direction: Direction::from_speed_byte(data[3]),
            functions: decode_functions(&data[STATUS_MIN_PAYLOAD..]),
        })
    }

    /// Indices of functions reported as on, ascending.
    pub fn active_functions(&self) -> impl Iterator<Item = u16> + '_ {
        self.functions
            .iter()
            .filter_map(|(&index, &on)| on.then_some(index))
    }
}

impl TryFrom<&Frame> for LocoStatus {
    type Error = Error;

    fn try_from(frame: &Frame) -> Result<Self> {
        Self::decode(frame)
    }
}

/// Function bits from payload byte 4 onward.
fn decode_functions(bytes: &[u8]) -> FunctionMap {
    let mut functions = FunctionMap::new();
    let Some((&legacy, extended)) = bytes.split_first() else {
        return functions;
    };

    for (index, mask) in LEGACY_FUNCTION_BITS {
        functions.insert(index, legacy & mask != 0);
    }

    // Indices stop at u16::MAX; any bytes beyond that are ignored.
    let max_bytes = usize::from((u16::MAX - FIRST_EXTENDED_FUNCTION) / 8);
    for (k, &byte) in extended.iter().take(max_bytes).enumerate() {
        let base = FIRST_EXTENDED_FUNCTION + 8 * k as u16;
        for bit in 0..8u16 {
            functions.insert(base + bit, byte & (1 << bit) != 0);
        }
    }

    functions
}

impl fmt::Display for LocoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loco #{}: speed {}", self.address, self.speed)?;
        match self.speed_step_mode.steps() {
            Some(steps) => write!(f, "/{steps}")?,
            None => f.write_str("/?")?,
        }
        write!(f, ", direction: {}, active functions: [", self.direction.as_str())?;
        for (i, index) in self.active_functions().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "F{index}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_frame(payload: &[u8]) -> Frame {
        Frame::with_payload(header::X_BUS, x_header::LOCO_INFO, payload.to_vec())
    }

    fn decode(payload: &[u8]) -> LocoStatus {
        LocoStatus::decode(&status_frame(payload)).unwrap()
    }

    // =========================================================================
    // Frame Type
    // =========================================================================

    #[test]
    fn rejects_other_headers() {
        let frame = Frame::with_payload([0x50, 0x00], x_header::LOCO_INFO, [0, 3, 4, 0]);
        assert!(matches!(
            LocoStatus::decode(&frame),
            Err(Error::UnexpectedFrameType { header: [0x50, 0x00], .. })
        ));
    }

    #[test]
    fn rejects_other_x_headers() {
        let frame = Frame::with_payload(header::X_BUS, x_header::GET_LOCO_INFO, [0xF0, 0, 3]);
        assert!(matches!(
            LocoStatus::decode(&frame),
            Err(Error::UnexpectedFrameType { x_header: Some(0xE3), .. })
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let result = LocoStatus::decode(&status_frame(&[0x00, 0x03, 0x04]));
        assert!(matches!(
            result,
            Err(Error::TruncatedStatus { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn decodes_from_parsed_bytes() {
        let bytes = status_frame(&[0x00, 0xE8, 0x04, 0x8A, 0x00]).serialize();
        let frame = Frame::parse(&bytes).unwrap();
        let status = LocoStatus::try_from(&frame).unwrap();
        assert_eq!(status.address, 232);
        assert_eq!(status.speed, 9);
    }

    // =========================================================================
    // Address
    // =========================================================================

    #[test]
    fn address_masks_then_shifts_msb() {
        assert_eq!(decode(&[0x00, 0x02, 0x04, 0x00]).address, 2);
        assert_eq!(decode(&[0x12, 0x34, 0x04, 0x00]).address, 0x1234);
        // Top two bits of the MSB are flags, not address bits.
        assert_eq!(decode(&[0xC0, 0x80, 0x04, 0x00]).address, 0x80);
        assert_eq!(decode(&[0xE7, 0x0F, 0x04, 0x00]).address, 9999);
    }

    // =========================================================================
    // Speed
    // =========================================================================

    #[test]
    fn fourteen_steps() {
        let status = decode(&[0, 3, 0x01, 5]);
        assert_eq!(status.speed_step_mode, SpeedStepMode::FourteenStep);
        assert_eq!(status.speed, 4);
    }

    #[test]
    fn twenty_eight_steps() {
        let status = decode(&[0, 3, 0x02, 6]);
        assert_eq!(status.speed_step_mode, SpeedStepMode::TwentyEightStep);
        assert_eq!(status.speed, 10);
    }

    #[test]
    fn twenty_eight_steps_ignores_bit_four() {
        assert_eq!(decode(&[0, 3, 0x02, 0x16]).speed, 10);
    }

    #[test]
    fn hundred_twenty_six_steps() {
        let status = decode(&[0, 3, 0x04, 1]);
        assert_eq!(status.speed_step_mode, SpeedStepMode::HundredTwentySixStep);
        assert_eq!(status.speed, 0);
        assert_eq!(decode(&[0, 3, 0x04, 0x7F]).speed, 126);
    }

    #[test]
    fn zero_magnitude_floors_at_zero() {
        assert_eq!(decode(&[0, 3, 0x01, 0]).speed, 0);
        assert_eq!(decode(&[0, 3, 0x02, 0]).speed, 0);
        assert_eq!(decode(&[0, 3, 0x04, 0]).speed, 0);
    }

    #[test]
    fn selector_uses_low_three_bits() {
        assert_eq!(
            decode(&[0, 3, 0xF4, 10]).speed_step_mode,
            SpeedStepMode::HundredTwentySixStep
        );
    }

    #[test]
    fn unknown_selector_is_not_an_error() {
        let status = decode(&[0, 3, 0x03, 0x90]);
        assert_eq!(status.speed_step_mode, SpeedStepMode::Unknown(3));
        assert_eq!(status.speed, 0);
        assert_eq!(status.direction, Direction::Forward);
    }

    #[test]
    fn direction_from_bit_seven() {
        assert_eq!(decode(&[0, 3, 4, 0x85]).direction, Direction::Forward);
        assert_eq!(decode(&[0, 3, 4, 0x05]).direction, Direction::Backward);
        assert_eq!(decode(&[0, 3, 4, 0x85]).speed, 4);
    }

    // =========================================================================
    // Functions
    // =========================================================================

    #[test]
    fn no_function_bytes_means_empty_map() {
        assert!(decode(&[0, 3, 4, 0]).functions.is_empty());
    }

    #[test]
    fn legacy_function_layout() {
        let functions = decode(&[0, 3, 4, 0, 0b0001_0011]).functions;
        assert_eq!(functions.len(), 5);
        assert!(functions[&0]);
        assert!(functions[&1]);
        assert!(functions[&2]);
        assert!(!functions[&3]);
        assert!(!functions[&4]);
    }

    #[test]
    fn legacy_function_f3_f4() {
        let functions = decode(&[0, 3, 4, 0, 0b0000_1100]).functions;
        assert!(functions[&3]);
        assert!(functions[&4]);
        assert!(!functions[&0]);
    }

    #[test]
    fn extended_function_bytes() {
        let functions = decode(&[0, 3, 4, 0, 0, 0b0001_0010, 0b1000_0000]).functions;
        assert_eq!(functions.len(), 5 + 16);
        assert!(functions[&6]);
        assert!(functions[&9]);
        assert!(!functions[&7]);
        assert!(functions[&20]);
        assert!(!functions[&13]);
        assert!(!functions.contains_key(&21));
    }

    #[test]
    fn oversized_function_block_is_capped() {
        let mut payload = vec![0, 3, 4, 0x80, 0];
        payload.extend_from_slice(&[0xFF; 8200]);
        let bytes = status_frame(&payload).serialize();
        let status = LocoStatus::decode(&Frame::parse(&bytes).unwrap()).unwrap();

        assert_eq!(status.functions.len(), 5 + 8191 * 8);
        assert_eq!(status.functions.keys().next_back(), Some(&65532));
        assert!(status.functions[&65532]);
    }

    #[test]
    fn active_functions_sorted() {
        let status = decode(&[0, 3, 4, 0, 0b0001_0001, 0b0000_0010]);
        let active: Vec<u16> = status.active_functions().collect();
        assert_eq!(active, vec![0, 1, 6]);
    }

    #[test]
    fn display_summary() {
        let status = decode(&[0, 232, 4, 0x8B, 0b0001_0000, 0b0000_0010]);
        assert_eq!(
            status.to_string(),
            "loco #232: speed 10/126, direction: forward, active functions: [F0, F6]"
        );
    }
}
