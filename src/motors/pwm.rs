// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Software PWM for two brushed motors.
//!
//! One hardware timer counts a fixed 256-tick period. Per period, per motor:
//!
//! - **overflow**: both bridge lines go low,
//! - **compare** at `255 - duty`: the line selected by the motor's direction goes high, if the
//!   outputs are enabled.
//!
//! A duty of 0 disables the motor's compare event, so the motor stays braked (both lines low).
//! Since every period starts with both lines low and only one line is ever raised, the two legs of
//! a bridge are never high together.

use embedded_hal::digital::v2::OutputPin;

use super::{Direction, MotorCommand, MotorControl, MotorId};

/// One H-bridge: raise a single leg, or drop both.
pub trait HBridge {
    /// Drive the leg for `direction` high, the other one low.
    fn drive(&mut self, direction: Direction);

    /// Drive both legs low.
    fn release(&mut self);
}

/// An H-bridge built from two GPIO outputs.
pub struct BridgeLegs<F, B> {
    forward: F,
    backward: B,
}

impl<F: OutputPin, B: OutputPin> BridgeLegs<F, B> {
    /// Take both pins and drive them low.
    pub fn new(forward: F, backward: B) -> Self {
        let mut legs = Self { forward, backward };
        legs.release();
        legs
    }

    pub fn free(self) -> (F, B) {
        (self.forward, self.backward)
    }
}

impl<F: OutputPin, B: OutputPin> HBridge for BridgeLegs<F, B> {
    fn drive(&mut self, direction: Direction) {
        // Lower the opposite leg first.
        match direction {
            Direction::Forward => {
                self.backward.set_low().ok();
                self.forward.set_high().ok();
            }
            Direction::Backward => {
                self.forward.set_low().ok();
                self.backward.set_high().ok();
            }
        }
    }

    fn release(&mut self) {
        self.forward.set_low().ok();
        self.backward.set_low().ok();
    }
}

/// The compare side of the PWM timer.
pub trait CompareTimer {
    /// Schedule `motor`'s compare event at `at` ticks into the period, or disable it with `None`.
    fn set_compare(&mut self, motor: MotorId, at: Option<u8>);
}

/// Compare position realising `duty`, `None` when the motor must stay low.
#[inline]
pub fn compare_for(duty: u8) -> Option<u8> {
    if duty == 0 {
        None
    } else {
        Some(u8::MAX - duty)
    }
}

/// PWM state of both motors.
///
/// [`on_overflow`](Self::on_overflow) and [`on_compare`](Self::on_compare) are called from the
/// PWM timer interrupt; everything else from the control loop or the state machine.
pub struct MotorPwm<L, R, T> {
    left: L,
    right: R,
    timer: T,
    commands: [MotorCommand; 2],
    enabled: bool,
}

impl<L: HBridge, R: HBridge, T: CompareTimer> MotorPwm<L, R, T> {
    /// Start disabled, braked, with both compare events off.
    pub fn new(left: L, right: R, timer: T) -> Self {
        let mut pwm = Self {
            left,
            right,
            timer,
            commands: [MotorCommand::BRAKE; 2],
            enabled: false,
        };
        pwm.disable();
        pwm
    }

    /// Period start: every line low.
    pub fn on_overflow(&mut self) {
        self.left.release();
        self.right.release();
    }

    /// Compare match of `motor`.
    pub fn on_compare(&mut self, motor: MotorId) {
        let cmd = self.commands[motor.index()];
        if !self.enabled || cmd.duty == 0 {
            return;
        }
        match motor {
            MotorId::Left => self.left.drive(cmd.direction),
            MotorId::Right => self.right.drive(cmd.direction),
        }
    }

    fn release(&mut self, motor: MotorId) {
        match motor {
            MotorId::Left => self.left.release(),
            MotorId::Right => self.right.release(),
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<L: HBridge, R: HBridge, T: CompareTimer> MotorControl for MotorPwm<L, R, T> {
    fn set(&mut self, motor: MotorId, command: MotorCommand) {
        self.commands[motor.index()] = command;
        let at = compare_for(command.duty);
        self.timer.set_compare(motor, at);
        if at.is_none() {
            self.release(motor);
        }
    }

    fn enable(&mut self) {
        if !self.enabled {
            crate::log_debug!("motors enabled");
        }
        self.enabled = true;
    }

    fn disable(&mut self) {
        if self.enabled {
            crate::log_debug!("motors disabled");
        }
        self.enabled = false;
        for motor in MotorId::ALL {
            self.commands[motor.index()] = MotorCommand::BRAKE;
            self.timer.set_compare(motor, None);
        }
        self.left.release();
        self.right.release();
    }

    #[inline]
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn command(&self, motor: MotorId) -> MotorCommand {
        self.commands[motor.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Pin(Rc<Cell<bool>>);

    impl OutputPin for Pin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.set(true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Timer {
        compare: [Option<u8>; 2],
    }

    impl CompareTimer for Timer {
        fn set_compare(&mut self, motor: MotorId, at: Option<u8>) {
            self.compare[motor.index()] = at;
        }
    }

    struct Rig {
        pins: [Pin; 4],
        pwm: MotorPwm<BridgeLegs<Pin, Pin>, BridgeLegs<Pin, Pin>, Timer>,
    }

    impl Rig {
        fn new() -> Self {
            let pins: [Pin; 4] = Default::default();
            let pwm = MotorPwm::new(
                BridgeLegs::new(pins[0].clone(), pins[1].clone()),
                BridgeLegs::new(pins[2].clone(), pins[3].clone()),
                Timer::default(),
            );
            Self { pins, pwm }
        }

        /// (forward, backward) line levels of `motor`.
        fn lines(&self, motor: MotorId) -> (bool, bool) {
            let i = motor.index() * 2;
            (self.pins[i].0.get(), self.pins[i + 1].0.get())
        }
    }

    #[test]
    fn compare_position_follows_duty() {
        assert_eq!(compare_for(0), None);
        assert_eq!(compare_for(1), Some(254));
        assert_eq!(compare_for(255), Some(0));
    }

    #[test]
    fn starts_disabled_and_low() {
        let rig = Rig::new();
        assert!(!rig.pwm.is_enabled());
        assert_eq!(rig.lines(MotorId::Left), (false, false));
        assert_eq!(rig.pwm.timer().compare, [None, None]);
    }

    #[test]
    fn compare_raises_leg_for_direction() {
        let mut rig = Rig::new();
        rig.pwm.enable();
        rig.pwm.set(MotorId::Left, MotorCommand::forward(100));
        rig.pwm.set(MotorId::Right, MotorCommand::backward(200));
        assert_eq!(rig.pwm.timer().compare, [Some(155), Some(55)]);

        rig.pwm.on_overflow();
        rig.pwm.on_compare(MotorId::Left);
        rig.pwm.on_compare(MotorId::Right);
        assert_eq!(rig.lines(MotorId::Left), (true, false));
        assert_eq!(rig.lines(MotorId::Right), (false, true));

        rig.pwm.on_overflow();
        assert_eq!(rig.lines(MotorId::Left), (false, false));
        assert_eq!(rig.lines(MotorId::Right), (false, false));
    }

    #[test]
    fn direction_change_never_overlaps_legs() {
        let mut rig = Rig::new();
        rig.pwm.enable();
        rig.pwm.set(MotorId::Left, MotorCommand::forward(100));
        rig.pwm.on_compare(MotorId::Left);
        rig.pwm.set(MotorId::Left, MotorCommand::backward(100));
        rig.pwm.on_compare(MotorId::Left);
        assert_eq!(rig.lines(MotorId::Left), (false, true));
    }

    #[test]
    fn zero_duty_brakes() {
        let mut rig = Rig::new();
        rig.pwm.enable();
        rig.pwm.set(MotorId::Left, MotorCommand::forward(100));
        rig.pwm.on_compare(MotorId::Left);
        rig.pwm.set(MotorId::Left, MotorCommand::forward(0));

        assert_eq!(rig.pwm.timer().compare[0], None);
        assert_eq!(rig.lines(MotorId::Left), (false, false));
        rig.pwm.on_compare(MotorId::Left);
        assert_eq!(rig.lines(MotorId::Left), (false, false));
    }

    #[test]
    fn disabled_outputs_ignore_compare() {
        let mut rig = Rig::new();
        rig.pwm.set(MotorId::Right, MotorCommand::forward(255));
        rig.pwm.on_compare(MotorId::Right);
        assert_eq!(rig.lines(MotorId::Right), (false, false));
    }

    #[test]
    fn disable_forces_low_and_zeroes_duty() {
        let mut rig = Rig::new();
        rig.pwm.enable();
        rig.pwm.set(MotorId::Left, MotorCommand::forward(255));
        rig.pwm.set(MotorId::Right, MotorCommand::backward(255));
        rig.pwm.on_compare(MotorId::Left);
        rig.pwm.on_compare(MotorId::Right);

        rig.pwm.disable();
        assert_eq!(rig.lines(MotorId::Left), (false, false));
        assert_eq!(rig.lines(MotorId::Right), (false, false));
        assert_eq!(rig.pwm.command(MotorId::Left).duty, 0);
        assert_eq!(rig.pwm.timer().compare, [None, None]);

        // Re-enabling does not resume the stale command.
        rig.pwm.enable();
        rig.pwm.on_compare(MotorId::Left);
        assert_eq!(rig.lines(MotorId::Left), (false, false));
    }

    #[test]
    fn shared_handle_forwards_calls() {
        let shared = crate::sync::Shared::new(Rig::new().pwm);
        let mut handle = &shared;
        handle.enable();
        handle.set(MotorId::Right, MotorCommand::backward(9));
        assert!(handle.is_enabled());
        assert_eq!(handle.command(MotorId::Right), MotorCommand::backward(9));
    }
}
