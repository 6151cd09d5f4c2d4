//! # relay-core
//!
//! Shared library for the chat relay containing the wire codec and the
//! per-connection session pipeline.
//!
//! This crate is used by both the server and client applications.  It never
//! opens sockets itself: the session driver works over any
//! `AsyncRead + AsyncWrite` stream, so the binaries decide where bytes come
//! from.
//!
//! # Architecture overview (for beginners)
//!
//! The relay is a chat room in its simplest form.  Clients connect over TCP,
//! send short text messages, and the server sends every message back out to
//! every connected client (the sender included).
//!
//! - **`protocol`** – How bytes travel over the network.  Each message is a
//!   4-byte decimal length header followed by up to 512 body bytes.
//!
//! - **`session`** – Everything one connection needs: a read state machine
//!   that alternates header/body reads, a FIFO outbound queue that keeps at
//!   most one write in flight, and the tokio task driver that ties both to a
//!   stream.  Other tasks talk to a running session through a cloneable
//!   [`SessionHandle`].

pub mod protocol;
pub mod session;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::Message` instead of `relay_core::protocol::message::Message`.
pub use protocol::frame::{
    decode_frame, decode_header, encode_frame, encode_header, ProtocolError, HEADER_LENGTH,
    MAX_BODY_LENGTH, MAX_FRAME_LENGTH,
};
pub use protocol::message::Message;
pub use session::connection::{
    CloseReason, Enqueue, Session, SessionError, SessionHandle, DEFAULT_OUTBOUND_QUEUE_LIMIT,
};
pub use session::id::{SessionId, SessionIdAllocator};
pub use session::participant::Participant;
pub use session::read::SessionState;
