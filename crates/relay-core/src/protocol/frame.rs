//! Text-header codec for encoding and decoding chat relay frames.
//!
//! Wire format:
//! ```text
//! [header:4][body:N]
//! ```
//! The header holds the body length as right-justified decimal ASCII padded
//! with spaces (`"   5"` for a five-byte body).  `N` is at most
//! [`MAX_BODY_LENGTH`], so a frame is never longer than [`MAX_FRAME_LENGTH`].
//! There is no version byte, no type byte and no trailing delimiter: the body
//! is opaque.
//!
//! # Header parsing
//!
//! Leading spaces are padding.  After them at least one byte must remain and
//! every remaining byte must be an ASCII digit, so `"0005"`, `"  12"` and
//! `" 512"` are accepted while `"12  "`, `"+512"`, `"    "` and `"ab12"` are
//! rejected with [`ProtocolError::MalformedHeader`].

use thiserror::Error;

use crate::protocol::message::Message;

/// Width of the decimal length header in bytes.
pub const HEADER_LENGTH: usize = 4;

/// Largest body a single frame may carry.
pub const MAX_BODY_LENGTH: usize = 512;

/// Largest complete frame on the wire (header plus body).
pub const MAX_FRAME_LENGTH: usize = HEADER_LENGTH + MAX_BODY_LENGTH;

/// Errors that can occur while decoding frames.
///
/// Every variant is fatal for the connection that produced it: the byte
/// stream cannot be resynchronised once a header is unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The header parsed to a length above [`MAX_BODY_LENGTH`].
    #[error("oversized body: header declares {declared} bytes, maximum is {max}")]
    OversizedBody { declared: usize, max: usize },

    /// The header contains something other than space padding and digits.
    #[error("malformed frame header \"{}\"", .header.escape_ascii())]
    MalformedHeader { header: [u8; HEADER_LENGTH] },

    /// The byte slice is shorter than the frame it starts.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a body length into a fixed-width header.
///
/// Lengths above [`MAX_BODY_LENGTH`] are clamped first, matching the silent
/// truncation applied to bodies by [`encode_frame`].
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::encode_header;
///
/// assert_eq!(&encode_header(5), b"   5");
/// assert_eq!(&encode_header(512), b" 512");
/// assert_eq!(&encode_header(9000), b" 512");
/// ```
pub fn encode_header(body_length: usize) -> [u8; HEADER_LENGTH] {
    let mut header = [b' '; HEADER_LENGTH];
    let mut remaining = body_length.min(MAX_BODY_LENGTH);
    let mut pos = HEADER_LENGTH;

    // Fill digits right to left; MAX_BODY_LENGTH always fits in the header.
    loop {
        pos -= 1;
        header[pos] = b'0' + (remaining % 10) as u8;
        remaining /= 10;
        if remaining == 0 || pos == 0 {
            break;
        }
    }
    header
}

/// Encodes `body` into a complete frame.
///
/// Bodies longer than [`MAX_BODY_LENGTH`] are truncated without error.
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::encode_frame;
///
/// assert_eq!(encode_frame(b"hello"), b"   5hello".to_vec());
/// assert_eq!(encode_frame(&[b'x'; 600]).len(), 516);
/// ```
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let body = &body[..body.len().min(MAX_BODY_LENGTH)];
    let mut buf = Vec::with_capacity(HEADER_LENGTH + body.len());
    buf.extend_from_slice(&encode_header(body.len()));
    buf.extend_from_slice(body);
    buf
}

/// Parses a frame header into the body length that follows it.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedHeader`] if the header is not space
/// padding followed by digits, and [`ProtocolError::OversizedBody`] if the
/// value exceeds [`MAX_BODY_LENGTH`].
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::{decode_header, ProtocolError};
///
/// assert_eq!(decode_header(b"  42"), Ok(42));
/// assert_eq!(decode_header(b"0007"), Ok(7));
/// assert!(matches!(decode_header(b" 513"), Err(ProtocolError::OversizedBody { .. })));
/// ```
pub fn decode_header(header: &[u8; HEADER_LENGTH]) -> Result<usize, ProtocolError> {
    let malformed = || ProtocolError::MalformedHeader { header: *header };

    let digits_start = header
        .iter()
        .position(|&b| b != b' ')
        .ok_or_else(malformed)?;
    let digits = &header[digits_start..];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }

    let declared = digits
        .iter()
        .fold(0usize, |acc, &d| acc * 10 + usize::from(d - b'0'));
    if declared > MAX_BODY_LENGTH {
        return Err(ProtocolError::OversizedBody {
            declared,
            max: MAX_BODY_LENGTH,
        });
    }
    Ok(declared)
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + body), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when `bytes` does not yet hold
/// a complete frame, or a header error from [`decode_header`].
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::{decode_frame, encode_frame};
///
/// let mut bytes = encode_frame(b"one");
/// bytes.extend_from_slice(&encode_frame(b"two"));
/// let (first, n) = decode_frame(&bytes).unwrap();
/// let (second, _) = decode_frame(&bytes[n..]).unwrap();
/// assert_eq!(first.body(), b"one");
/// assert_eq!(second.body(), b"two");
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<(Message, usize), ProtocolError> {
    let Some(header) = bytes
        .get(..HEADER_LENGTH)
        .and_then(|h| <&[u8; HEADER_LENGTH]>::try_from(h).ok())
    else {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_LENGTH,
            available: bytes.len(),
        });
    };

    let body_length = decode_header(header)?;
    let total = HEADER_LENGTH + body_length;
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }

    Ok((Message::new(&bytes[HEADER_LENGTH..total]), total))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
