// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STM32F777 board layer.

pub mod capture;
pub mod edge;
pub mod flash;
pub mod pins;
pub mod pwm_timer;
pub mod usart;

pub use capture::CaptureTimer;
pub use edge::EdgeInput;
pub use flash::FlashStore;
pub use pins::BoardPins;
pub use pwm_timer::{PwmEvents, PwmTimer};
pub use usart::Usart;
