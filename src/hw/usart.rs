// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART transport for the configuration protocol.
//!
//! Raw bytes only; no line endings or text. Diagnostics go over RTT instead.
//!
//! To talk to the device from the host machine, connect to the USB-serial port at
//! [`BAUD_RATE`] baud, 8N1.

use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Rx, Serial, Tx},
};

use crate::protocol::Transport;

pub const BAUD_RATE: u32 = 115_200;

/// A byte could not be sent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TxFailed;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
    peeked: Option<u8>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        Self {
            tx,
            rx,
            peeked: None,
        }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) -> Result<(), TxFailed> {
        block!(self.tx.write(b)).map_err(|_| TxFailed)
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }

    fn poll_rx(&mut self) -> Option<u8> {
        match self.rx.read() {
            Ok(b) => Some(b),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                crate::log_debug!("usart rx error, byte dropped");
                None
            }
        }
    }
}

impl<U: Instance> Transport for Usart<U> {
    type Error = TxFailed;

    fn has_data(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.poll_rx();
        }
        self.peeked.is_some()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.peeked.take().or_else(|| self.poll_rx())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TxFailed> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        self.flush();
        Ok(())
    }
}
