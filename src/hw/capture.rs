// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Free-running capture counter on TIM2.
//!
//! The counter ticks every [`TICK_US`] µs and wraps at 16 bits, so its update interrupt fires
//! every 65536 ticks (~262 ms). The edge interrupts read it to time pulses; the update interrupt
//! closes a signal-loss watchdog window.

use stm32f7xx_hal::{pac, rcc::Clocks};

use crate::input::TICK_US;

const TICK_HZ: u32 = 1_000_000 / TICK_US;

pub struct CaptureTimer<TIM> {
    tim: TIM,
}

impl<TIM> CaptureTimer<TIM> {
    /// Consume the wrapper and return the underlying timer peripheral.
    #[inline]
    pub fn free(self) -> TIM {
        self.tim
    }
}

impl CaptureTimer<pac::TIM2> {
    /// Configure TIM2 as a 16-bit counter at [`TICK_US`] µs per tick with the update interrupt
    /// enabled.
    pub fn tim2(tim2: pac::TIM2, clocks: &Clocks) -> Self {
        let tim = tim2;

        // RCC was consumed by `constrain()`; only the TIM2 enable bit is touched here.
        unsafe {
            (*pac::RCC::ptr())
                .apb1enr
                .modify(|_, w| w.tim2en().set_bit());
        }

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        let psc = clocks.timclk1().raw() / TICK_HZ - 1;
        tim.psc.write(|w| unsafe { w.bits(psc) });

        // Auto-reload: wrap at 16 bits even though TIM2 is 32-bit
        tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

        // Load the prescaler, then drop the update flag this raised
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.dier.modify(|_, w| w.uie().set_bit());

        // Enable the counter
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Current counter value.
    #[inline]
    pub fn now(&self) -> u16 {
        self.tim.cnt.read().bits() as u16
    }

    /// Whether the counter wrapped since the last call. Clears the flag.
    #[inline]
    pub fn take_overflow(&mut self) -> bool {
        if self.tim.sr.read().uif().bit_is_set() {
            self.tim.sr.write(|w| unsafe { w.bits(!1) });
            true
        } else {
            false
        }
    }
}
