// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Persisted ESC configuration.
//!
//! The [`ConfigurationRecord`] is the only state that survives a power cycle. It is stored as one
//! contiguous block through a [`ConfigStore`] and is always loaded and written whole.
//!
//! ## Stored layout
//!
//! | Offset | Size | Field |
//! | ------ | ---- | ----- |
//! | 0      | 1    | sentinel (`0x00` = configured, anything else = never configured) |
//! | 1      | 1    | control mode (0 = TANK, 1 = DELTA) |
//! | 2      | 1    | deadzone |
//! | 3      | 4    | ch1 min, ch1 max, ch2 min, ch2 max |
//! | 7      | 24   | r1, s1, t1, r2, s2, t2 (`i32`, little-endian) |

use core::fmt;

use crate::mixer::PlaneMixer;

/// Size of the stored record in bytes.
pub const RECORD_LEN: usize = 31;

/// Sentinel value of a configured record.
pub const SENTINEL_WRITTEN: u8 = 0x00;
/// What erased storage reads back as.
pub const SENTINEL_ERASED: u8 = 0xFF;

/// Factory deadzone, in duty-cycle units.
pub const DEFAULT_DEADZONE: u8 = 5;

/// How the two input channels drive the two motors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
#[repr(u8)]
pub enum ControlMode {
    /// Channel 1 drives the left motor, channel 2 the right motor.
    Tank = 0,
    /// Both channels drive both motors through a plane mixer each.
    Delta = 1,
}

impl ControlMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Tank),
            1 => Some(Self::Delta),
            _ => None,
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tank => f.write_str("TANK"),
            Self::Delta => f.write_str("DELTA"),
        }
    }
}

/// Calibrated stick travel of one channel, in channel ticks (0..=250).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelRange {
    pub min: u8,
    pub max: u8,
}

impl ChannelRange {
    pub const FULL: Self = Self { min: 0, max: 250 };
}

/// Everything the mixer and the protocol know about the vehicle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigurationRecord {
    pub control: ControlMode,
    /// Duty values at or below this are forced to zero.
    pub deadzone: u8,
    pub ch1: ChannelRange,
    pub ch2: ChannelRange,
    /// Plane mixer of the left motor (DELTA mode).
    pub left: PlaneMixer,
    /// Plane mixer of the right motor (DELTA mode).
    pub right: PlaneMixer,
}

impl ConfigurationRecord {
    /// Factory configuration written on first boot.
    pub const DEFAULT: Self = Self {
        control: ControlMode::Tank,
        deadzone: DEFAULT_DEADZONE,
        ch1: ChannelRange::FULL,
        ch2: ChannelRange::FULL,
        left: PlaneMixer::ZERO,
        right: PlaneMixer::ZERO,
    };

    /// Serialize into the stored layout, sentinel included.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = SENTINEL_WRITTEN;
        buf[1] = self.control as u8;
        buf[2] = self.deadzone;
        buf[3] = self.ch1.min;
        buf[4] = self.ch1.max;
        buf[5] = self.ch2.min;
        buf[6] = self.ch2.max;

        let coefficients = [
            self.left.r,
            self.left.s,
            self.left.t,
            self.right.r,
            self.right.s,
            self.right.t,
        ];
        for (slot, value) in buf[7..].chunks_exact_mut(4).zip(coefficients) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        buf
    }

    /// Parse a stored block.
    ///
    /// Returns `Ok(None)` when the sentinel says the device was never configured.
    pub fn decode(buf: &[u8; RECORD_LEN]) -> Result<Option<Self>, ConfigError> {
        if buf[0] != SENTINEL_WRITTEN {
            return Ok(None);
        }
        let control = ControlMode::from_raw(buf[1]).ok_or(ConfigError::Corrupt)?;

        let mut coefficients = [0i32; 6];
        for (value, bytes) in coefficients.iter_mut().zip(buf[7..].chunks_exact(4)) {
            *value = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        let [r1, s1, t1, r2, s2, t2] = coefficients;

        Ok(Some(Self {
            control,
            deadzone: buf[2],
            ch1: ChannelRange {
                min: buf[3],
                max: buf[4],
            },
            ch2: ChannelRange {
                min: buf[5],
                max: buf[6],
            },
            left: PlaneMixer::new(r1, s1, t1),
            right: PlaneMixer::new(r2, s2, t2),
        }))
    }
}

impl Default for ConfigurationRecord {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Non-volatile storage holding exactly one configuration block.
pub trait ConfigStore {
    type Error: fmt::Debug;

    /// Read the whole block into `buf`.
    fn load(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<(), Self::Error>;

    /// Replace the whole block with `buf`.
    fn store(&mut self, buf: &[u8; RECORD_LEN]) -> Result<(), Self::Error>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum ConfigError {
    /// The sentinel claims a configured record but the contents do not decode.
    Corrupt,
    /// The backing store failed.
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt => f.write_str("stored configuration is corrupt"),
            Self::Storage => f.write_str("configuration storage failed"),
        }
    }
}

/// Write `record` to `store`.
pub fn persist<S: ConfigStore>(store: &mut S, record: &ConfigurationRecord) -> Result<(), ConfigError> {
    store.store(&record.encode()).map_err(|_| {
        crate::log_error!("config store failed");
        ConfigError::Storage
    })
}

/// Load the record, writing factory defaults when the store holds none (or a corrupt one).
pub fn load_or_init<S: ConfigStore>(store: &mut S) -> Result<ConfigurationRecord, ConfigError> {
    let mut buf = [SENTINEL_ERASED; RECORD_LEN];
    store.load(&mut buf).map_err(|_| {
        crate::log_error!("config load failed");
        ConfigError::Storage
    })?;

    match ConfigurationRecord::decode(&buf) {
        Ok(Some(record)) => {
            crate::log_info!("config loaded, mode {}", record.control);
            Ok(record)
        }
        Ok(None) => {
            crate::log_info!("no stored config, writing factory defaults");
            let record = ConfigurationRecord::DEFAULT;
            persist(store, &record)?;
            Ok(record)
        }
        Err(e) => {
            crate::log_warn!("{}, restoring factory defaults", e);
            let record = ConfigurationRecord::DEFAULT;
            persist(store, &record)?;
            Ok(record)
        }
    }
}

/// RAM-backed [`ConfigStore`], used on the host and in tests.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    block: [u8; RECORD_LEN],
    fail_writes: bool,
    writes: usize,
}

/// The [`MemoryStore`] was told to fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StoreFailed;

impl MemoryStore {
    /// A store that reads back as erased storage.
    pub const fn erased() -> Self {
        Self {
            block: [SENTINEL_ERASED; RECORD_LEN],
            fail_writes: false,
            writes: 0,
        }
    }

    /// A store already holding `record`.
    pub fn with_record(record: &ConfigurationRecord) -> Self {
        Self {
            block: record.encode(),
            fail_writes: false,
            writes: 0,
        }
    }

    /// Make every subsequent `store` fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn block(&self) -> &[u8; RECORD_LEN] {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut [u8; RECORD_LEN] {
        &mut self.block
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::erased()
    }
}

impl ConfigStore for MemoryStore {
    type Error = StoreFailed;

    fn load(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<(), StoreFailed> {
        buf.copy_from_slice(&self.block);
        Ok(())
    }

    fn store(&mut self, buf: &[u8; RECORD_LEN]) -> Result<(), StoreFailed> {
        if self.fail_writes {
            return Err(StoreFailed);
        }
        self.block.copy_from_slice(buf);
        self.writes += 1;
        Ok(())
    }
}
