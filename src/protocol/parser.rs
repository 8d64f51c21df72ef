// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time parser for configuration requests.

use crate::protocol::messages::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    WaitKind,
    WritePayload { len: usize },
}

pub struct Parser {
    state: State,
    version: ProtocolVersion,
    payload: [u8; MAX_WRITE_LEN - 1],
}

impl Parser {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            state: State::WaitKind,
            version,
            payload: [0; MAX_WRITE_LEN - 1],
        }
    }

    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Process a single incoming byte. Returns `Some(Request)` once a request is complete.
    pub fn push(&mut self, byte: u8) -> Option<Request> {
        match self.state {
            State::WaitKind => match byte {
                REQUEST_READ => return Some(Request::Read),
                REQUEST_WRITE => self.state = State::WritePayload { len: 0 },
                _ => {
                    // Unknown request kind, keep waiting
                    crate::log_debug!("ignoring request kind {}", byte);
                }
            },
            State::WritePayload { len } => {
                self.payload[len] = byte;
                let len = len + 1;
                let expected = self.version.write_payload_len();
                if len < expected {
                    self.state = State::WritePayload { len };
                } else {
                    self.state = State::WaitKind;
                    return WriteRequest::decode(self.version, &self.payload[..expected])
                        .map(Request::Write);
                }
            }
        }
        None
    }

    /// Whether a request has started but not completed.
    #[inline]
    pub fn in_progress(&self) -> bool {
        self.state != State::WaitKind
    }

    /// Drop a partial request.
    pub fn abort(&mut self) {
        self.state = State::WaitKind;
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ProtocolVersion::default())
    }
}
