// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PWM period timer on TIM4.
//!
//! 256 ticks of [`TICK_US`] µs per period (~1 kHz). The update interrupt starts a period; compare
//! channels 1 and 2 raise the left and right motor respectively. No timer pin is used, the bridge
//! lines are plain GPIO outputs driven from the interrupt.

use stm32f7xx_hal::{pac, rcc::Clocks};

use crate::input::TICK_US;
use crate::motors::{CompareTimer, MotorId};

const TICK_HZ: u32 = 1_000_000 / TICK_US;

/// Interrupt flags taken in one [`PwmTimer::take_events`] call.
#[derive(Copy, Clone, Debug, Default)]
pub struct PwmEvents {
    pub overflow: bool,
    pub compare: [bool; 2],
}

pub struct PwmTimer {
    tim: pac::TIM4,
}

impl PwmTimer {
    /// Configure TIM4 and start it with both compare interrupts off.
    pub fn tim4(tim4: pac::TIM4, clocks: &Clocks) -> Self {
        let tim = tim4;

        unsafe {
            (*pac::RCC::ptr())
                .apb1enr
                .modify(|_, w| w.tim4en().set_bit());
        }

        tim.cr1.modify(|_, w| w.cen().clear_bit());

        let psc = clocks.timclk1().raw() / TICK_HZ - 1;
        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(0xFF) });

        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.dier
            .modify(|_, w| w.uie().set_bit().cc1ie().clear_bit().cc2ie().clear_bit());

        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Read and clear the pending overflow and compare flags.
    pub fn take_events(&mut self) -> PwmEvents {
        let sr = self.tim.sr.read();
        let dier = self.tim.dier.read();
        let events = PwmEvents {
            overflow: sr.uif().bit_is_set(),
            compare: [
                sr.cc1if().bit_is_set() && dier.cc1ie().bit_is_set(),
                sr.cc2if().bit_is_set() && dier.cc2ie().bit_is_set(),
            ],
        };

        // rc_w0: writing 1 leaves a flag alone
        let mut clear = 0u32;
        if sr.uif().bit_is_set() {
            clear |= 1 << 0;
        }
        if sr.cc1if().bit_is_set() {
            clear |= 1 << 1;
        }
        if sr.cc2if().bit_is_set() {
            clear |= 1 << 2;
        }
        self.tim.sr.write(|w| unsafe { w.bits(!clear) });

        events
    }
}

impl CompareTimer for PwmTimer {
    fn set_compare(&mut self, motor: MotorId, at: Option<u8>) {
        match (motor, at) {
            (MotorId::Left, Some(at)) => {
                self.tim.ccr1.write(|w| unsafe { w.bits(u32::from(at)) });
                self.tim.dier.modify(|_, w| w.cc1ie().set_bit());
            }
            (MotorId::Left, None) => self.tim.dier.modify(|_, w| w.cc1ie().clear_bit()),
            (MotorId::Right, Some(at)) => {
                self.tim.ccr2.write(|w| unsafe { w.bits(u32::from(at)) });
                self.tim.dier.modify(|_, w| w.cc2ie().set_bit());
            }
            (MotorId::Right, None) => self.tim.dier.modify(|_, w| w.cc2ie().clear_bit()),
        }
    }
}
