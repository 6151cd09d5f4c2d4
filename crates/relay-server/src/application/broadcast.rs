//! BroadcastRegistry: room membership, recent history and fan-out.
//!
//! The registry is the relay's only shared state.  Every session task calls
//! into it: once on arrival (`join`), once per received message (`deliver`)
//! and once on departure (`leave`).
//!
//! # Delivery guarantees (for beginners)
//!
//! All three operations run inside one critical section, so they are totally
//! ordered.  That gives every member two guarantees:
//!
//! - A newcomer sees the replay of recent history and then every later
//!   message, with no gap and no duplicate, because no `deliver` can slip in
//!   between the replay and the membership insert.
//! - Every member receives a delivered message before the next `deliver`
//!   starts its fan-out, so all members see messages in the same order.
//!
//! Fan-out only *queues* messages (`Participant::deliver` never waits), so no
//! `.await` ever happens while the lock is held.
//!
//! # Why a std `Mutex`?
//!
//! The critical sections are short and contain no `.await`, so a blocking
//! `std::sync::Mutex` is cheaper than `tokio::sync::Mutex` and lets the
//! registry be used from synchronous callbacks such as
//! [`Session::run`](relay_core::Session::run)'s `on_message`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use relay_core::{Message, Participant, SessionHandle, SessionId};
use tracing::{debug, trace};

use crate::application::history::RecentHistory;

struct RegistryState<P> {
    members: HashMap<SessionId, P>,
    history: RecentHistory,
}

/// Membership map plus bounded replay history for one relay.
///
/// Generic over the member type so tests can register mocks; production code
/// uses the default, [`SessionHandle`].
pub struct BroadcastRegistry<P: Participant = SessionHandle> {
    state: Mutex<RegistryState<P>>,
}

impl<P: Participant> BroadcastRegistry<P> {
    pub fn new() -> Self {
        Self::with_history(RecentHistory::new())
    }

    /// Creates a registry that starts from the given history buffer.
    pub fn with_history(history: RecentHistory) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                members: HashMap::new(),
                history,
            }),
        }
    }

    /// Adds `participant` and replays stored history to it alone, oldest first.
    ///
    /// A participant whose id is already registered replaces the old entry.
    pub fn join(&self, participant: P) {
        let mut state = self.lock();
        let id = participant.id();
        for message in state.history.iter() {
            participant.deliver(message);
        }
        let replayed = state.history.len();
        if state.members.insert(id, participant).is_some() {
            debug!(session = %id, "replaced existing registry entry");
        }
        debug!(
            session = %id,
            replayed,
            members = state.members.len(),
            "session joined"
        );
    }

    /// Removes the member with `id`.  Returns `false` if it was not present.
    pub fn leave(&self, id: SessionId) -> bool {
        let mut state = self.lock();
        let removed = state.members.remove(&id).is_some();
        if removed {
            debug!(session = %id, members = state.members.len(), "session left");
        }
        removed
    }

    /// Records `message` in history and queues it on every member, the
    /// sender included.
    pub fn deliver(&self, message: Message) {
        let mut state = self.lock();
        state.history.push(message.clone());
        for member in state.members.values() {
            member.deliver(&message);
        }
        trace!(
            members = state.members.len(),
            body_length = message.body_length(),
            "message delivered"
        );
    }

    pub fn member_count(&self) -> usize {
        self.lock().members.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().members.contains_key(&id)
    }

    /// Copy of the stored history, oldest first.
    pub fn history(&self) -> Vec<Message> {
        self.lock().history.iter().cloned().collect()
    }

    /// Members only ever queue messages, so a panic inside a critical section
    /// cannot leave membership or history half-updated.
    fn lock(&self) -> MutexGuard<'_, RegistryState<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: Participant> Default for BroadcastRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
