//! The capability the broadcast registry needs from a member.

use crate::protocol::message::Message;
use crate::session::id::SessionId;

/// Something that can receive relayed messages.
///
/// The registry only ever needs two things from a member: a stable identity
/// to key its membership map, and a way to hand over a message without
/// waiting.  [`SessionHandle`](crate::SessionHandle) is the production
/// implementation; tests substitute recording or `mockall` doubles.
pub trait Participant: Send + Sync {
    /// Stable identity of this participant.
    fn id(&self) -> SessionId;

    /// Queues `message` for delivery.
    ///
    /// Must not block and must tolerate being called after the participant
    /// has started closing.
    fn deliver(&self, message: &Message);
}
