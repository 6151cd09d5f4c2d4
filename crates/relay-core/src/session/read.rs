//! Inbound half of a session: the header/body read state machine.
//!
//! # Session lifecycle
//!
//! ```text
//! Connecting ──► AwaitingHeader ──► AwaitingBody ──┐
//! (client only)        ▲                          │
//!                      └──────────────────────────┘
//!
//!   any state ──(transport error / bad header / close)──► Closed
//! ```
//!
//! [`InboundFrame`] is the pure part of that machine.  It owns a buffer of
//! exactly one maximum-size frame and tells the driver how many bytes to read
//! next: [`InboundFrame::pending`] hands out the slice to fill, and
//! [`InboundFrame::complete`] consumes it once full.  No I/O happens here, so
//! every transition is unit-testable without a socket.

use crate::protocol::frame::{decode_header, ProtocolError, HEADER_LENGTH, MAX_FRAME_LENGTH};
use crate::protocol::message::Message;

/// Lifecycle state of a whole session, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Client only: the transport is being established.
    Connecting,
    /// Waiting for the next 4-byte header.
    AwaitingHeader,
    /// Header decoded; waiting for `body_length` body bytes.
    AwaitingBody { body_length: usize },
    /// Terminal.  The transport is shut down and the session has left the
    /// registry (server) or the client is exiting.
    Closed,
}

/// Which part of a frame the next read fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    AwaitingHeader,
    AwaitingBody { body_length: usize },
}

impl From<ReadState> for SessionState {
    fn from(state: ReadState) -> Self {
        match state {
            ReadState::AwaitingHeader => SessionState::AwaitingHeader,
            ReadState::AwaitingBody { body_length } => SessionState::AwaitingBody { body_length },
        }
    }
}

/// The partially received inbound frame of one session.
pub struct InboundFrame {
    state: ReadState,
    buf: [u8; MAX_FRAME_LENGTH],
}

impl InboundFrame {
    /// Creates an empty frame buffer waiting for a header.
    pub fn new() -> Self {
        Self {
            state: ReadState::AwaitingHeader,
            buf: [0; MAX_FRAME_LENGTH],
        }
    }

    /// Current read state.
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// The slice the next read must fill completely.
    ///
    /// Empty while awaiting a zero-length body; filling an empty slice
    /// succeeds immediately and yields an empty message.
    pub fn pending(&mut self) -> &mut [u8] {
        match self.state {
            ReadState::AwaitingHeader => &mut self.buf[..HEADER_LENGTH],
            ReadState::AwaitingBody { body_length } => {
                &mut self.buf[HEADER_LENGTH..HEADER_LENGTH + body_length]
            }
        }
    }

    /// Advances the machine after [`pending`](Self::pending) was filled.
    ///
    /// Returns `Ok(None)` after a header (now awaiting the body) and
    /// `Ok(Some(message))` after a body (back to awaiting a header).
    ///
    /// # Errors
    ///
    /// Returns the header's [`ProtocolError`].  The state stays
    /// `AwaitingHeader` and the caller must close the session.
    pub fn complete(&mut self) -> Result<Option<Message>, ProtocolError> {
        match self.state {
            ReadState::AwaitingHeader => {
                let mut header = [0u8; HEADER_LENGTH];
                header.copy_from_slice(&self.buf[..HEADER_LENGTH]);
                let body_length = decode_header(&header)?;
                self.state = ReadState::AwaitingBody { body_length };
                Ok(None)
            }
            ReadState::AwaitingBody { body_length } => {
                let message = Message::new(&self.buf[HEADER_LENGTH..HEADER_LENGTH + body_length]);
                self.state = ReadState::AwaitingHeader;
                Ok(Some(message))
            }
        }
    }
}

impl Default for InboundFrame {
    fn default() -> Self {
        Self::new()
    }
}
