//! Outbound half of a session: the FIFO write queue.
//!
//! ```text
//!            enqueue (queue was empty)
//!   Idle ───────────────────────────────► Writing
//!    ▲                                      │  │
//!    │  write completed, queue now empty    │  │ write completed,
//!    └──────────────────────────────────────┘  │ more queued: start next
//!                                       ▲      │
//!                                       └──────┘
//! ```
//!
//! The message at the front of the queue is the one being written.  It is
//! popped only when its write completes, so there is never more than one
//! write in flight and frames leave in the order they were queued, however
//! many arrive while a write is pending.

use std::collections::VecDeque;

use crate::protocol::message::Message;

/// Whether a write is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Idle,
    Writing,
}

/// Ordered queue of messages waiting to be written to one session.
#[derive(Debug)]
pub struct OutboundQueue {
    pending: VecDeque<Message>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> WriteState {
        if self.pending.is_empty() {
            WriteState::Idle
        } else {
            WriteState::Writing
        }
    }

    /// Number of queued messages, including the one being written.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Appends a message.
    ///
    /// Returns `true` when the queue was idle, meaning the caller must start
    /// writing [`in_flight`](Self::in_flight) now.  While `Writing`, the new
    /// message simply waits its turn.
    pub fn enqueue(&mut self, message: Message) -> bool {
        let was_idle = self.pending.is_empty();
        self.pending.push_back(message);
        was_idle
    }

    /// The message currently being written, if any.
    pub fn in_flight(&self) -> Option<&Message> {
        self.pending.front()
    }

    /// Records that the in-flight write finished successfully.
    ///
    /// Pops the written message and returns the next one to write, or `None`
    /// when the queue drained and the state is back to `Idle`.
    pub fn complete_write(&mut self) -> Option<&Message> {
        self.pending.pop_front();
        self.pending.front()
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}
