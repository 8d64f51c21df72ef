// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Motor Outputs
//!
//! Motor-level commands and the interface the control loop and the state machine drive them
//! through.
//!
//! ## Modules
//!
//! - [`pwm`] - Interrupt-driven software PWM over two H-bridges.

pub mod pwm;

pub use pwm::{BridgeLegs, CompareTimer, HBridge, MotorPwm};

use crate::sync::Shared;

/// Which bridge leg a motor is driven through.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Requested direction and duty (0 = braked, 255 = fully on) of one motor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub struct MotorCommand {
    pub direction: Direction,
    pub duty: u8,
}

impl MotorCommand {
    pub const BRAKE: Self = Self {
        direction: Direction::Forward,
        duty: 0,
    };

    pub const fn forward(duty: u8) -> Self {
        Self {
            direction: Direction::Forward,
            duty,
        }
    }

    pub const fn backward(duty: u8) -> Self {
        Self {
            direction: Direction::Backward,
            duty,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum MotorId {
    Left = 0,
    Right = 1,
}

impl MotorId {
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What the rest of the firmware needs from the motor outputs.
pub trait MotorControl {
    /// Latch a new command for `motor`. Takes effect from the next PWM period.
    fn set(&mut self, motor: MotorId, command: MotorCommand);

    /// Allow the outputs to be driven.
    fn enable(&mut self);

    /// Force every bridge line low immediately and zero both duties.
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// The last command latched for `motor`.
    fn command(&self, motor: MotorId) -> MotorCommand;
}

/// Motor outputs owned by a [`Shared`] cell, as used when the PWM interrupt and the main loop both
/// touch them.
impl<M: MotorControl> MotorControl for &Shared<M> {
    fn set(&mut self, motor: MotorId, command: MotorCommand) {
        self.with_mut(|m| m.set(motor, command));
    }

    fn enable(&mut self) {
        self.with_mut(|m| m.enable());
    }

    fn disable(&mut self) {
        self.with_mut(|m| m.disable());
    }

    fn is_enabled(&self) -> bool {
        self.with(|m| m.is_enabled())
    }

    fn command(&self, motor: MotorId) -> MotorCommand {
        self.with(|m| m.command(motor))
    }
}
