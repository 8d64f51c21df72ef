// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Mixer
//!
//! Turns the two filtered channel values into one command per motor.
//!
//! - **TANK**: channel 1 drives the left motor and channel 2 the right motor, each through a
//!   forward [`LinearMapper`] above the calibrated neutral and a backward one at or below it.
//! - **DELTA**: both channels drive each motor through that motor's [`PlaneMixer`], evaluated at
//!   the neutral-corrected stick position. The sign of the plane value picks the direction.
//!
//! Magnitudes are in motor units (`0..=MAX_MOTOR_VALUE`), shifted down to a duty byte and then
//! suppressed to zero at or below the configured deadzone.
//!
//! ## Modules
//!
//! - [`linear`] - 1D slope/intercept mapper.
//! - [`plane`] - 2D plane mixer and its three-point derivation.

pub mod linear;
pub mod plane;

pub use linear::LinearMapper;
pub use plane::{PlaneMixer, Point3};

use core::fmt;

use crate::config::{ConfigurationRecord, ControlMode};
use crate::input::CHANNEL_NEUTRAL;
use crate::motors::{Direction, MotorCommand};

/// Motor extremum used by the linear mappers (`255 << OUTPUT_SHIFT`).
pub const MAX_MOTOR_VALUE: i16 = 8160;

/// Shift from motor units down to a duty byte.
pub const OUTPUT_SHIFT: u32 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum MixerError {
    /// A linear mapper was asked to map an empty input range.
    DegenerateRange,
    /// Three calibration points do not define a plane over the stick axes (`n.z == 0`).
    DegeneratePlane,
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateRange => f.write_str("empty input range"),
            Self::DegeneratePlane => f.write_str("points do not define a plane (n.z == 0)"),
        }
    }
}

/// Commands for both motors produced by one mixer pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MixerOutput {
    pub left: MotorCommand,
    pub right: MotorCommand,
}

/// Scale a motor-unit value to a duty byte.
#[inline]
pub fn condition(value: i32) -> u8 {
    (value >> OUTPUT_SHIFT).clamp(0, 255) as u8
}

/// Zero `duty` when it does not exceed `deadzone`.
#[inline]
pub fn apply_deadzone(duty: u8, deadzone: u8) -> u8 {
    if duty > deadzone {
        duty
    } else {
        0
    }
}

/// Mixer state derived from neutral calibration.
///
/// Until [`calibrate`](Self::calibrate) runs every mapper is idle, so an uncalibrated mixer only
/// ever commands duty 0.
#[derive(Clone, Debug)]
pub struct Mixer {
    neutral: [i16; 2],
    forward: [LinearMapper; 2],
    backward: [LinearMapper; 2],
    calibrated: bool,
}

impl Mixer {
    pub const fn new() -> Self {
        Self {
            neutral: [CHANNEL_NEUTRAL as i16; 2],
            forward: [LinearMapper::IDLE; 2],
            backward: [LinearMapper::IDLE; 2],
            calibrated: false,
        }
    }

    /// Take `samples` as the resting stick position and rebuild the four mappers from it and the
    /// configured channel extrema.
    pub fn calibrate(&mut self, samples: [u16; 2], config: &ConfigurationRecord) {
        let ranges = [config.ch1, config.ch2];
        for (ch, (&sample, range)) in samples.iter().zip(ranges).enumerate() {
            let neutral = sample as i16;
            self.neutral[ch] = neutral;
            self.backward[ch] = half_mapper(range.min.into(), neutral, MAX_MOTOR_VALUE, 0, ch);
            self.forward[ch] = half_mapper(neutral, range.max.into(), 0, MAX_MOTOR_VALUE, ch);
        }
        self.calibrated = true;

        crate::log_info!(
            "neutral calibrated: ch1 = {}, ch2 = {}",
            self.neutral[0],
            self.neutral[1]
        );
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Calibrated neutral of each channel.
    #[inline]
    pub fn neutral(&self) -> [i16; 2] {
        self.neutral
    }

    /// Compute both motor commands for the current filtered channel values.
    pub fn mix(&self, samples: [u16; 2], config: &ConfigurationRecord) -> MixerOutput {
        let values = [samples[0] as i16, samples[1] as i16];
        match config.control {
            ControlMode::Tank => MixerOutput {
                left: self.tank(0, values[0], config.deadzone),
                right: self.tank(1, values[1], config.deadzone),
            },
            ControlMode::Delta => {
                let ch1 = values[0].wrapping_sub(self.neutral[0]);
                let ch2 = values[1].wrapping_sub(self.neutral[1]);
                MixerOutput {
                    left: delta(&config.left, ch1, ch2, config.deadzone),
                    right: delta(&config.right, ch1, ch2, config.deadzone),
                }
            }
        }
    }

    fn tank(&self, ch: usize, value: i16, deadzone: u8) -> MotorCommand {
        let (direction, mapper) = if value > self.neutral[ch] {
            (Direction::Forward, &self.forward[ch])
        } else {
            (Direction::Backward, &self.backward[ch])
        };
        let duty = condition(i32::from(mapper.map(value)));
        MotorCommand {
            direction,
            duty: apply_deadzone(duty, deadzone),
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

fn half_mapper(in_min: i16, in_max: i16, out_min: i16, out_max: i16, ch: usize) -> LinearMapper {
    LinearMapper::new(in_min, in_max, out_min, out_max).unwrap_or_else(|e| {
        crate::log_warn!("ch{} mapper {}..{}: {}, half idle", ch + 1, in_min, in_max, e);
        LinearMapper::IDLE
    })
}

fn delta(plane: &PlaneMixer, ch1: i16, ch2: i16, deadzone: u8) -> MotorCommand {
    let value = plane.map(ch1, ch2);
    let (direction, magnitude) = if value < 0 {
        (Direction::Backward, value.saturating_neg())
    } else {
        (Direction::Forward, value)
    };
    MotorCommand {
        direction,
        duty: apply_deadzone(condition(magnitude), deadzone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRange;

    fn tank_config() -> ConfigurationRecord {
        ConfigurationRecord::DEFAULT
    }

    fn calibrated(config: &ConfigurationRecord) -> Mixer {
        let mut mixer = Mixer::new();
        mixer.calibrate([125, 125], config);
        mixer
    }

    #[test]
    fn uncalibrated_mixer_commands_nothing() {
        let mixer = Mixer::new();
        let out = mixer.mix([250, 0], &tank_config());
        assert_eq!(out.left.duty, 0);
        assert_eq!(out.right.duty, 0);
    }

    #[test]
    fn tank_full_stick_is_full_duty() {
        let config = tank_config();
        let mixer = calibrated(&config);

        let out = mixer.mix([250, 0], &config);
        assert_eq!(
            out.left,
            MotorCommand {
                direction: Direction::Forward,
                duty: 255
            }
        );
        assert_eq!(out.right.direction, Direction::Backward);
        // 8125 >> 5
        assert_eq!(out.right.duty, 253);
    }

    #[test]
    fn tank_neutral_is_braked_backward() {
        let config = tank_config();
        let mixer = calibrated(&config);
        let out = mixer.mix([125, 125], &config);
        assert_eq!(out.left.direction, Direction::Backward);
        assert_eq!(out.left.duty, 0);
        assert_eq!(out.right.duty, 0);
    }

    #[test]
    fn tank_rising_stick_is_monotonic_forward() {
        let config = tank_config();
        let mixer = calibrated(&config);

        let mut last = 0u8;
        for value in 126..=250u16 {
            let cmd = mixer.mix([value, 125], &config).left;
            assert_eq!(cmd.direction, Direction::Forward);
            assert!(cmd.duty >= last, "duty fell at {value}");
            last = cmd.duty;
        }
        assert_eq!(last, 255);
    }

    #[test]
    fn tank_falling_stick_is_monotonic_backward() {
        let config = tank_config();
        let mixer = calibrated(&config);

        let mut last = 0u8;
        for value in (0..=125u16).rev() {
            let cmd = mixer.mix([125, value], &config).right;
            assert_eq!(cmd.direction, Direction::Backward);
            assert!(cmd.duty >= last, "duty fell at {value}");
            last = cmd.duty;
        }
    }

    #[test]
    fn tank_deadzone_suppresses_small_commands() {
        let config = tank_config();
        let mixer = calibrated(&config);
        // 65 * 127 - 8090 = 165, >> 5 = 5 == deadzone
        assert_eq!(mixer.mix([127, 125], &config).left.duty, 0);
        // 230 >> 5 = 7
        assert_eq!(mixer.mix([128, 125], &config).left.duty, 7);
    }

    #[test]
    fn calibration_uses_off_center_neutral() {
        let config = tank_config();
        let mut mixer = Mixer::new();
        mixer.calibrate([130, 120], &config);
        assert_eq!(mixer.neutral(), [130, 120]);
        assert!(mixer.is_calibrated());

        let out = mixer.mix([130, 121], &config);
        assert_eq!(out.left.direction, Direction::Backward);
        assert_eq!(out.left.duty, 0);
        assert_eq!(out.right.direction, Direction::Forward);
    }

    #[test]
    fn degenerate_half_range_stays_idle() {
        let mut config = tank_config();
        config.ch1 = ChannelRange { min: 125, max: 250 };
        let mixer = calibrated(&config);

        // Backward half of ch1 has no travel, so it never drives.
        assert_eq!(mixer.mix([0, 125], &config).left.duty, 0);
        assert_eq!(mixer.mix([250, 125], &config).left.duty, 255);
    }

    #[test]
    fn delta_neutral_stick_is_zero() {
        let mut config = tank_config();
        config.control = ControlMode::Delta;
        config.left = PlaneMixer::new(0, -65, 65);
        config.right = PlaneMixer::new(0, -65, -65);
        let mixer = calibrated(&config);

        let out = mixer.mix([125, 125], &config);
        assert_eq!(out.left.duty, 0);
        assert_eq!(out.right.duty, 0);
    }

    #[test]
    fn delta_sign_picks_direction() {
        let mut config = tank_config();
        config.control = ControlMode::Delta;
        config.left = PlaneMixer::new(0, -65, 65);
        config.right = PlaneMixer::new(0, -65, -65);
        let mixer = calibrated(&config);

        // Pure ch2 deflection turns on the spot.
        let out = mixer.mix([125, 250], &config);
        // left: -65 * 125 = -8125
        assert_eq!(out.left.direction, Direction::Backward);
        assert_eq!(out.left.duty, 253);
        assert_eq!(out.right.direction, Direction::Forward);
        assert_eq!(out.right.duty, 253);
    }

    #[test]
    fn delta_clamps_large_magnitudes() {
        let mut config = tank_config();
        config.control = ControlMode::Delta;
        config.left = PlaneMixer::new(0, -200, 0);
        config.right = PlaneMixer::new(0, 200, 0);
        let mixer = calibrated(&config);

        let out = mixer.mix([250, 125], &config);
        assert_eq!(out.left.duty, 255);
        assert_eq!(out.right.direction, Direction::Backward);
        assert_eq!(out.right.duty, 255);
    }

    #[test]
    fn deadzone_boundary_is_exclusive() {
        let mut config = tank_config();
        config.control = ControlMode::Delta;
        config.deadzone = 5;
        let mixer = calibrated(&config);

        config.left = PlaneMixer::new(5 << OUTPUT_SHIFT, 0, 0);
        assert_eq!(mixer.mix([125, 125], &config).left.duty, 0);

        config.left = PlaneMixer::new(6 << OUTPUT_SHIFT, 0, 0);
        assert_eq!(mixer.mix([125, 125], &config).left.duty, 6);
    }

    #[test]
    fn condition_clamps_to_byte() {
        assert_eq!(condition(-1), 0);
        assert_eq!(condition(31), 0);
        assert_eq!(condition(32), 1);
        assert_eq!(condition(i32::from(MAX_MOTOR_VALUE)), 255);
        assert_eq!(condition(100_000), 255);
    }
}
