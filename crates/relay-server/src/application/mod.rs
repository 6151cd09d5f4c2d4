//! Application layer use cases for the relay server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the shared protocol/session code in
//! `relay_core` and the infrastructure (sockets, files).  Code here:
//!
//! - **Orchestrates** sessions to fulfil the relay's one goal: every message
//!   any client sends reaches every connected client.
//! - **Depends on abstractions**: the registry talks to members through the
//!   [`Participant`](relay_core::Participant) trait, so tests can use mocks.
//! - **Contains no network I/O and no file system access**.
//!
//! # Sub-modules
//!
//! - **`broadcast`** – The membership registry.  Joins replay recent history,
//!   deliveries fan out to every member.
//!
//! - **`history`** – The bounded buffer of recent messages replayed to
//!   newcomers.

pub mod broadcast;
pub mod history;
