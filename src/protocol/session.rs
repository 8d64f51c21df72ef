// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! One CONFIG session: feeds transport bytes to the [`Parser`] and answers complete requests.
//!
//! A WRITE is persisted before it becomes live. If the store fails the device answers NOK and keeps
//! running on the previous record. A partial request that sees no byte for
//! [`TRANSACTION_TIMEOUT_MS`] is dropped; the session keeps waiting for a new request.

use core::fmt;

use heapless::{Deque, Vec};

use crate::config::{self, ConfigStore};
use crate::protocol::messages::*;
use crate::protocol::parser::Parser;
use crate::registers::Registers;

/// Idle time after which a partial request is dropped.
pub const TRANSACTION_TIMEOUT_MS: u32 = 1000;

/// Polled byte stream to the host tool.
pub trait Transport {
    type Error: fmt::Debug;

    /// Whether at least one received byte is waiting. Does not consume it.
    fn has_data(&mut self) -> bool;

    /// Take the next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// How a finished transaction ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Transaction {
    Read,
    Written,
    /// The WRITE could not be persisted; NOK was sent.
    WriteFailed,
}

pub struct ConfigSession {
    parser: Parser,
    last_byte_ms: u32,
}

impl ConfigSession {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            parser: Parser::new(version),
            last_byte_ms: 0,
        }
    }

    /// Start a fresh session at `now_ms`.
    pub fn begin(&mut self, now_ms: u32) {
        self.parser.abort();
        self.last_byte_ms = now_ms;
    }

    #[inline]
    pub fn in_progress(&self) -> bool {
        self.parser.in_progress()
    }

    /// Consume available bytes until a transaction completes or the transport runs dry.
    ///
    /// Bytes after a completed request stay in the transport.
    pub fn poll<T: Transport, S: ConfigStore>(
        &mut self,
        transport: &mut T,
        store: &mut S,
        regs: &Registers,
        now_ms: u32,
    ) -> Option<Transaction> {
        while let Some(byte) = transport.read_byte() {
            self.last_byte_ms = now_ms;
            if let Some(request) = self.parser.push(byte) {
                return Some(self.complete(request, transport, store, regs));
            }
        }

        if self.parser.in_progress()
            && now_ms.wrapping_sub(self.last_byte_ms) >= TRANSACTION_TIMEOUT_MS
        {
            crate::log_warn!("config request timed out, discarding partial request");
            self.parser.abort();
        }
        None
    }

    fn complete<T: Transport, S: ConfigStore>(
        &mut self,
        request: Request,
        transport: &mut T,
        store: &mut S,
        regs: &Registers,
    ) -> Transaction {
        match request {
            Request::Read => {
                let reply = ReadReply::from_record(&regs.config()).encode();
                send(transport, &reply);
                crate::log_info!("config READ served");
                Transaction::Read
            }
            Request::Write(write) => {
                let record = write.apply_to(&regs.config());
                match config::persist(store, &record) {
                    Ok(()) => {
                        regs.set_config(record);
                        send(transport, &[MSG_OK]);
                        crate::log_info!("config WRITE stored, mode {}", record.control);
                        Transaction::Written
                    }
                    Err(e) => {
                        send(transport, &[MSG_NOK]);
                        crate::log_error!("config WRITE rejected: {}", e);
                        Transaction::WriteFailed
                    }
                }
            }
        }
    }
}

impl Default for ConfigSession {
    fn default() -> Self {
        Self::new(ProtocolVersion::default())
    }
}

fn send<T: Transport>(transport: &mut T, bytes: &[u8]) {
    if transport.write_all(bytes).is_err() {
        crate::log_error!("config reply of {} bytes not sent", bytes.len());
    }
}

/// Capacity of each [`LoopbackTransport`] direction.
pub const LOOPBACK_LEN: usize = 64;

/// In-memory [`Transport`]: the host side queues bytes with [`inject`](Self::inject) and collects
/// replies with [`take_sent`](Self::take_sent).
#[derive(Default)]
pub struct LoopbackTransport {
    rx: Deque<u8, LOOPBACK_LEN>,
    tx: Vec<u8, LOOPBACK_LEN>,
}

/// The loopback's send buffer is full.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopbackFull;

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the device to receive. Bytes beyond the capacity are dropped.
    pub fn inject(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.rx.push_back(b).is_err() {
                break;
            }
        }
    }

    /// Everything the device has sent since the last call.
    pub fn take_sent(&mut self) -> Vec<u8, LOOPBACK_LEN> {
        core::mem::take(&mut self.tx)
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Transport for LoopbackTransport {
    type Error = LoopbackFull;

    fn has_data(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LoopbackFull> {
        self.tx.extend_from_slice(bytes).map_err(|_| LoopbackFull)
    }
}
