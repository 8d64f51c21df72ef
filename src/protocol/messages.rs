// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wire format of the configuration protocol.
//!
//! | Request | Bytes | Reply |
//! | ------- | ----- | ----- |
//! | READ  | `0x00` | `[OK, flags, deadzone, ch1 min, ch1 max, ch2 min, ch2 max]` |
//! | WRITE | `0x01, flags, deadzone, ch1 min, ch1 max, ch2 min, ch2 max[, R1, R2, S1]` | `[OK]` or `[NOK]` |
//!
//! `R1`, `R2` and `S1` are big-endian `i32` and only present with [`ProtocolVersion::Mixer`].
//! There is no framing and no checksum.

use crate::config::{ChannelRange, ConfigurationRecord, ControlMode};
use crate::mixer::PlaneMixer;

// Request kinds
pub const REQUEST_READ: u8 = 0x00;
pub const REQUEST_WRITE: u8 = 0x01;

// Status bytes
pub const MSG_OK: u8 = 0x01;
pub const MSG_NOK: u8 = 0x00;

/// Flags bit selecting TANK mode (clear = DELTA).
pub const FLAG_TANK: u8 = 1 << 1;

pub const READ_REPLY_LEN: usize = 7;

/// Fields of a WRITE that every protocol version carries (flags, deadzone, four extrema).
pub const WRITE_BASE_LEN: usize = 6;
/// Three big-endian `i32` plane coefficients.
pub const WRITE_MIXER_LEN: usize = 3 * 4;

/// Longest WRITE request, request-kind byte included.
pub const MAX_WRITE_LEN: usize = 1 + WRITE_BASE_LEN + WRITE_MIXER_LEN;

/// Which WRITE layout the device accepts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum ProtocolVersion {
    /// Flags, deadzone and extrema only. Plane coefficients are left as they are.
    Basic,
    /// Also carries R1, R2, S1.
    #[default]
    Mixer,
}

impl ProtocolVersion {
    /// Bytes following the request kind in a WRITE.
    pub const fn write_payload_len(self) -> usize {
        match self {
            Self::Basic => WRITE_BASE_LEN,
            Self::Mixer => WRITE_BASE_LEN + WRITE_MIXER_LEN,
        }
    }
}

/// A fully parsed request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Read,
    Write(WriteRequest),
}

/// Plane coefficients as sent by the host.
///
/// The device assumes the left and right planes are mirror images, so three numbers describe both:
/// `left = (R1, S1, S1)`, `right = (R2, S1, -S1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MixerCoefficients {
    pub r1: i32,
    pub r2: i32,
    pub s1: i32,
}

impl MixerCoefficients {
    pub fn left(&self) -> PlaneMixer {
        PlaneMixer::new(self.r1, self.s1, self.s1)
    }

    pub fn right(&self) -> PlaneMixer {
        PlaneMixer::new(self.r2, self.s1, self.s1.wrapping_neg())
    }
}

/// Payload of a WRITE request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteRequest {
    pub control: ControlMode,
    pub deadzone: u8,
    pub ch1: ChannelRange,
    pub ch2: ChannelRange,
    /// `None` for [`ProtocolVersion::Basic`].
    pub mixer: Option<MixerCoefficients>,
}

impl WriteRequest {
    /// Parse the bytes following the request kind. `payload` must be exactly
    /// [`ProtocolVersion::write_payload_len`] long.
    pub fn decode(version: ProtocolVersion, payload: &[u8]) -> Option<Self> {
        if payload.len() != version.write_payload_len() {
            return None;
        }
        let mixer = match version {
            ProtocolVersion::Basic => None,
            ProtocolVersion::Mixer => {
                let word = |i: usize| {
                    let at = WRITE_BASE_LEN + 4 * i;
                    i32::from_be_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
                };
                Some(MixerCoefficients {
                    r1: word(0),
                    r2: word(1),
                    s1: word(2),
                })
            }
        };

        Some(Self {
            control: control_from_flags(payload[0]),
            deadzone: payload[1],
            ch1: ChannelRange {
                min: payload[2],
                max: payload[3],
            },
            ch2: ChannelRange {
                min: payload[4],
                max: payload[5],
            },
            mixer,
        })
    }

    /// Serialize as the host sends it, request kind included. Returns the number of bytes written.
    pub fn encode(&self, out: &mut [u8; MAX_WRITE_LEN]) -> usize {
        out[0] = REQUEST_WRITE;
        out[1] = flags_for(self.control);
        out[2] = self.deadzone;
        out[3] = self.ch1.min;
        out[4] = self.ch1.max;
        out[5] = self.ch2.min;
        out[6] = self.ch2.max;

        let Some(mixer) = self.mixer else {
            return 1 + WRITE_BASE_LEN;
        };
        for (slot, value) in out[1 + WRITE_BASE_LEN..]
            .chunks_exact_mut(4)
            .zip([mixer.r1, mixer.r2, mixer.s1])
        {
            slot.copy_from_slice(&value.to_be_bytes());
        }
        MAX_WRITE_LEN
    }

    /// The record that results from applying this request to `current`.
    pub fn apply_to(&self, current: &ConfigurationRecord) -> ConfigurationRecord {
        let mut record = *current;
        record.control = self.control;
        record.deadzone = self.deadzone;
        record.ch1 = self.ch1;
        record.ch2 = self.ch2;
        if let Some(mixer) = self.mixer {
            record.left = mixer.left();
            record.right = mixer.right();
        }
        record
    }
}

/// Snapshot sent in reply to READ.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadReply {
    pub control: ControlMode,
    pub deadzone: u8,
    pub ch1: ChannelRange,
    pub ch2: ChannelRange,
}

impl ReadReply {
    pub fn from_record(record: &ConfigurationRecord) -> Self {
        Self {
            control: record.control,
            deadzone: record.deadzone,
            ch1: record.ch1,
            ch2: record.ch2,
        }
    }

    pub fn encode(&self) -> [u8; READ_REPLY_LEN] {
        [
            MSG_OK,
            flags_for(self.control),
            self.deadzone,
            self.ch1.min,
            self.ch1.max,
            self.ch2.min,
            self.ch2.max,
        ]
    }

    /// Parse a reply as the host receives it. `None` unless the status byte is OK.
    pub fn decode(bytes: &[u8; READ_REPLY_LEN]) -> Option<Self> {
        if bytes[0] != MSG_OK {
            return None;
        }
        Some(Self {
            control: control_from_flags(bytes[1]),
            deadzone: bytes[2],
            ch1: ChannelRange {
                min: bytes[3],
                max: bytes[4],
            },
            ch2: ChannelRange {
                min: bytes[5],
                max: bytes[6],
            },
        })
    }
}

#[inline]
fn flags_for(control: ControlMode) -> u8 {
    match control {
        ControlMode::Tank => FLAG_TANK,
        ControlMode::Delta => 0,
    }
}

#[inline]
fn control_from_flags(flags: u8) -> ControlMode {
    if flags & FLAG_TANK != 0 {
        ControlMode::Tank
    } else {
        ControlMode::Delta
    }
}
