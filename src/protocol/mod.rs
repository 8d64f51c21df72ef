// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Configuration Protocol
//!
//! Byte-oriented request/reply protocol spoken with the host configuration tool while the device
//! is in CONFIG.
//!
//! ## Modules
//!
//! - [`messages`] - Request kinds, status bytes and the READ/WRITE layouts.
//! - [`parser`] - Incremental request parser.
//! - [`session`] - Transaction handling, persistence and the transport interface.

pub mod messages;
pub mod parser;
pub mod session;

pub use messages::{ProtocolVersion, ReadReply, Request, WriteRequest};
pub use parser::Parser;
pub use session::{ConfigSession, LoopbackTransport, Transaction, Transport};
