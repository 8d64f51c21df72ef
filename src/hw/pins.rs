// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 ESC board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiod, Alternate, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOD);
/// ```
pub struct BoardPins {
    pub receiver: ReceiverPins,
    pub usart1: Usart1Pins,
    pub left: MotorPins<gpiod::PD12<Output<PushPull>>, gpiod::PD13<Output<PushPull>>>,
    pub right: MotorPins<gpiod::PD14<Output<PushPull>>, gpiod::PD15<Output<PushPull>>>,
    pub driver: DriverPins,
}

/// RC receiver channels (EXTI0 / EXTI1)
pub struct ReceiverPins {
    pub ch1: gpioa::PA0<Input<Floating>>,
    pub ch2: gpioa::PA1<Input<Floating>>,
}

/// Configuration link
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// Bridge inputs of one motor
pub struct MotorPins<F, B> {
    pub forward: F,
    pub backward: B,
}

/// Shared bridge driver control
pub struct DriverPins {
    pub nsleep: gpioa::PA4<Output<PushPull>>,
    pub disable: gpioa::PA3<Output<PushPull>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals. Every bridge line starts low and the
    /// bridge driver is woken up.
    pub fn new(gpioa: pac::GPIOA, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiod = gpiod.split();

        let mut driver = DriverPins {
            nsleep: gpioa.pa4.into_push_pull_output(),
            disable: gpioa.pa3.into_push_pull_output(),
        };
        driver.disable.set_low();
        driver.nsleep.set_high();

        Self {
            receiver: ReceiverPins {
                ch1: gpioa.pa0.into_floating_input(),
                ch2: gpioa.pa1.into_floating_input(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            left: MotorPins {
                forward: gpiod.pd12.into_push_pull_output(),
                backward: gpiod.pd13.into_push_pull_output(),
            },

            right: MotorPins {
                forward: gpiod.pd14.into_push_pull_output(),
                backward: gpiod.pd15.into_push_pull_output(),
            },

            driver,
        }
    }
}
