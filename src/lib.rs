// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Antweight ESC Firmware
//!
//! Dual brushed-motor speed controller for antweight combat robots, written in Rust, targeting an
//! STM32F777 MCU. Two RC receiver channels are timed, filtered and mixed into a direction and duty
//! for each motor. A byte protocol over the USART lets a host tool read and change the persisted
//! configuration.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`input`] | Pulse-width capture and the signal-loss watchdog |
//! | [`filter`] | Moving average per channel |
//! | [`mixer`] | TANK and DELTA mixing, neutral calibration |
//! | [`motors`] | Motor commands and software PWM over two H-bridges |
//! | [`control`] | Control update and the operating state machine |
//! | [`config`] | Persisted configuration record |
//! | [`protocol`] | Host configuration protocol |
//! | [`registers`], [`sync`] | State shared between interrupts and the main loop |
//! | `hw` | MCU-level wrappers around timers, EXTI, USART and flash (feature `board`) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod control;
pub mod filter;
pub mod input;
pub mod mixer;
pub mod motors;
pub mod protocol;
pub mod registers;
pub mod sync;

#[cfg(feature = "board")]
pub mod hw;
