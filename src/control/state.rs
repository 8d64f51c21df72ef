// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Operating state machine.
//!
//! ```text
//!          bytes, no signal            transaction done
//!   INIT ---------------------> CONFIG ----------------> INIT
//!    |
//!    | signal good, calibrated
//!    v          signal lost
//!  ACTIVE <-----------------> FAILSAFE
//!             signal good
//! ```
//!
//! ERROR is entered only from an unrecognised state value and never left.
//!
//! [`Supervisor::step`] never blocks. Every call performs one poll of the current state; the main
//! loop calls it continuously.

use core::fmt;

use crate::config::ConfigStore;
use crate::motors::MotorControl;
use crate::protocol::messages::ProtocolVersion;
use crate::protocol::session::{ConfigSession, Transport};
use crate::registers::Registers;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingState {
    Init = 0,
    Active = 1,
    Failsafe = 2,
    Config = 3,
    Error = 4,
}

impl OperatingState {
    /// Unknown values map to [`Error`](Self::Error).
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Init,
            1 => Self::Active,
            2 => Self::Failsafe,
            3 => Self::Config,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Active => "ACTIVE",
            Self::Failsafe => "FAILSAFE",
            Self::Config => "CONFIG",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Drives [`OperatingState`] transitions.
pub struct Supervisor {
    session: ConfigSession,
    /// A calibration request from INIT is outstanding.
    calibrating: bool,
}

impl Supervisor {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            session: ConfigSession::new(version),
            calibrating: false,
        }
    }

    /// Poll the current state once and perform at most one transition.
    pub fn step<M, T, S>(
        &mut self,
        regs: &Registers,
        motors: &mut M,
        transport: &mut T,
        store: &mut S,
        now_ms: u32,
    ) -> OperatingState
    where
        M: MotorControl,
        T: Transport,
        S: ConfigStore,
    {
        let state = regs.state();
        let signal_good = regs.signal_good();

        let next = match state {
            OperatingState::Init if self.calibrating => {
                if !signal_good {
                    crate::log_warn!("signal lost during calibration, waiting again");
                    regs.withdraw_calibration();
                    self.calibrating = false;
                    OperatingState::Init
                } else if !regs.calibration_pending() {
                    self.calibrating = false;
                    motors.enable();
                    OperatingState::Active
                } else {
                    OperatingState::Init
                }
            }
            OperatingState::Init => {
                if !signal_good && transport.has_data() {
                    self.session.begin(now_ms);
                    OperatingState::Config
                } else if signal_good {
                    regs.request_calibration();
                    self.calibrating = true;
                    OperatingState::Init
                } else {
                    OperatingState::Init
                }
            }
            OperatingState::Active => {
                if signal_good {
                    motors.enable();
                    OperatingState::Active
                } else {
                    motors.disable();
                    OperatingState::Failsafe
                }
            }
            OperatingState::Failsafe => {
                if signal_good {
                    motors.enable();
                    OperatingState::Active
                } else {
                    motors.disable();
                    OperatingState::Failsafe
                }
            }
            OperatingState::Config => match self.session.poll(transport, store, regs, now_ms) {
                Some(_) => OperatingState::Init,
                None => OperatingState::Config,
            },
            OperatingState::Error => {
                motors.disable();
                // Normalise an unrecognised raw value.
                regs.set_state(OperatingState::Error);
                OperatingState::Error
            }
        };

        if next != state {
            crate::log_info!("state {} -> {}", state, next);
            regs.set_state(next);
        }
        next
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(ProtocolVersion::default())
    }
}
