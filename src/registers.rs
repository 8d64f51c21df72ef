// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Named registers shared between interrupt handlers and the main loop.
//!
//! | Register | Written by | Read by |
//! | -------- | ---------- | ------- |
//! | `signal_good` | watchdog interrupt | state machine |
//! | `calibration_pending` | state machine (set), control update (clear) | both |
//! | `state` | state machine | anyone |
//! | `config` | configuration session | control update, session |
//!
//! The flags use `Release` stores and `Acquire` loads, so a reader that sees a flag change also
//! sees every write its owner made before changing it. The configuration record is wider than a
//! word and lives in a [`Shared`] cell.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::ConfigurationRecord;
use crate::control::state::OperatingState;
use crate::sync::Shared;

pub struct Registers {
    signal_good: AtomicBool,
    calibration_pending: AtomicBool,
    state: AtomicU8,
    config: Shared<ConfigurationRecord>,
}

impl Registers {
    pub const fn new(config: ConfigurationRecord) -> Self {
        Self {
            signal_good: AtomicBool::new(false),
            calibration_pending: AtomicBool::new(false),
            state: AtomicU8::new(OperatingState::Init as u8),
            config: Shared::new(config),
        }
    }

    #[inline]
    pub fn signal_good(&self) -> bool {
        self.signal_good.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_signal_good(&self, good: bool) {
        self.signal_good.store(good, Ordering::Release);
    }

    #[inline]
    pub fn calibration_pending(&self) -> bool {
        self.calibration_pending.load(Ordering::Acquire)
    }

    #[inline]
    pub fn request_calibration(&self) {
        self.calibration_pending.store(true, Ordering::Release);
    }

    /// Clear the calibration request. Returns whether one was pending.
    #[inline]
    pub fn take_calibration_request(&self) -> bool {
        self.calibration_pending.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn withdraw_calibration(&self) {
        self.calibration_pending.store(false, Ordering::Release);
    }

    /// Current operating state. An unrecognised raw value reads as [`OperatingState::Error`].
    #[inline]
    pub fn state(&self) -> OperatingState {
        OperatingState::from_raw(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_state(&self, state: OperatingState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Store a raw state byte without validation.
    #[inline]
    pub fn set_state_raw(&self, raw: u8) {
        self.state.store(raw, Ordering::Release);
    }

    /// Copy of the live configuration.
    #[inline]
    pub fn config(&self) -> ConfigurationRecord {
        self.config.get()
    }

    /// Replace the live configuration.
    #[inline]
    pub fn set_config(&self, config: ConfigurationRecord) {
        self.config.replace(config);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(ConfigurationRecord::DEFAULT)
    }
}
