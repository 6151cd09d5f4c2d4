//! Bounded buffer of the most recent relayed messages.

use std::collections::VecDeque;

use relay_core::Message;

/// Number of recent messages kept for replay to newly joined sessions.
pub const HISTORY_CAPACITY: usize = 100;

/// FIFO of the last [`HISTORY_CAPACITY`] messages, oldest first.
#[derive(Debug)]
pub struct RecentHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl RecentHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `message`, returning the evicted oldest message when full.
    pub fn push(&mut self, message: Message) -> Option<Message> {
        if self.capacity == 0 {
            return Some(message);
        }
        let evicted = if self.messages.len() == self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    /// Iterates stored messages from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new()
    }
}
