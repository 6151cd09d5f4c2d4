//! relay-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does relay-client do? (for beginners)
//!
//! The client is a terminal front end for one chat room:
//!
//! 1. Resolves `<host> <port>` and connects, trying each address in turn.
//! 2. Reads lines from stdin and sends each one as a message (at most 512
//!    bytes; longer lines are cut).
//! 3. Prints every message the relay sends back, one per line, including
//!    the client's own messages and the room's recent history.
//! 4. On end of input, finishes sending what is queued and exits.  If the
//!    relay closes the connection first, the client exits straight away.

/// Application layer: the chat use case and the traits it depends on.
pub mod application;

/// Infrastructure layer: network connect, stdin input and stdout display.
pub mod infrastructure;
