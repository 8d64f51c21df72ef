// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Receiver inputs on EXTI lines.
//!
//! Each input interrupts on both edges; the pin level read in the handler tells which edge it was.
//! [`SignalAcquisition`](crate::input::SignalAcquisition) ignores an edge it is not armed for,
//! which has the same effect as switching the trigger polarity after every edge.

use embedded_hal::digital::v2::InputPin;
use stm32f7xx_hal::{
    gpio::{Edge as Trigger, ExtiPin},
    pac::{EXTI, SYSCFG},
    rcc::APB2,
};

use crate::input::Edge;

pub struct EdgeInput<PIN> {
    pin: PIN,
}

impl<PIN: ExtiPin + InputPin> EdgeInput<PIN> {
    /// Route `pin` to its EXTI line and interrupt on both edges.
    pub fn new(mut pin: PIN, syscfg: &mut SYSCFG, exti: &mut EXTI, apb: &mut APB2) -> Self {
        pin.make_interrupt_source(syscfg, apb);
        pin.trigger_on_edge(exti, Trigger::RisingFalling);
        pin.enable_interrupt(exti);
        Self { pin }
    }

    /// Acknowledge the interrupt and report which edge caused it.
    pub fn service(&mut self) -> Edge {
        self.pin.clear_interrupt_pending_bit();
        if self.pin.is_high().unwrap_or(false) {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}
