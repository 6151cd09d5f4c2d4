//! Per-connection session machinery.
//!
//! - [`read`]: the pure header/body read state machine
//! - [`write`]: the FIFO outbound queue
//! - [`connection`]: the tokio driver tying both to a stream
//! - [`id`]: session identities
//! - [`participant`]: what the broadcast registry needs from a member

pub mod connection;
pub mod id;
pub mod participant;
pub mod read;
pub mod write;
