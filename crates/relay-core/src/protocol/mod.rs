//! Protocol module containing the frame codec and the message type.

pub mod frame;
pub mod message;

pub use frame::{decode_frame, decode_header, encode_frame, encode_header, ProtocolError};
pub use message::Message;
