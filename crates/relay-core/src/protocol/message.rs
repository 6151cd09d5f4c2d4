//! The immutable chat message relayed between clients.
//!
//! A [`Message`] stores its complete encoded frame (header + body) behind an
//! `Arc<[u8]>`.  The frame is built exactly once, when the message is created,
//! and every later clone is a reference-count bump.  That matters for the
//! server: one inbound message is fanned out to every connected session and
//! also kept in the replay history, and none of those copies re-encode or
//! copy the bytes.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::protocol::frame::{encode_frame, HEADER_LENGTH};

/// One relayed message.
///
/// Invariant: `body().len() <= MAX_BODY_LENGTH`.  Construction truncates
/// longer input instead of failing.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Message {
    frame: Arc<[u8]>,
}

impl Message {
    /// Creates a message from raw body bytes, truncating to
    /// [`MAX_BODY_LENGTH`](crate::protocol::frame::MAX_BODY_LENGTH).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use relay_core::Message;
    ///
    /// let msg = Message::new(b"hello");
    /// assert_eq!(msg.body(), b"hello");
    /// assert_eq!(msg.frame(), b"   5hello");
    /// ```
    pub fn new(body: impl AsRef<[u8]>) -> Self {
        Self {
            frame: encode_frame(body.as_ref()).into(),
        }
    }

    /// Creates a message from a line of text.
    ///
    /// Truncation counts bytes, not characters, so a multi-byte character
    /// that straddles the limit is cut.  [`Message::as_text`] renders such a
    /// tail lossily.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes())
    }

    /// The body bytes, without the header.
    pub fn body(&self) -> &[u8] {
        &self.frame[HEADER_LENGTH..]
    }

    /// Number of body bytes.
    pub fn body_length(&self) -> usize {
        self.frame.len() - HEADER_LENGTH
    }

    /// Returns `true` when the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body_length() == 0
    }

    /// The complete encoded frame, ready to be written to a stream.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("body_length", &self.body_length())
            .field("body", &self.as_text())
            .finish()
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(&text)
    }
}

impl From<&[u8]> for Message {
    fn from(body: &[u8]) -> Self {
        Self::new(body)
    }
}

impl From<Vec<u8>> for Message {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}
