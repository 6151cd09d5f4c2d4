//! Application layer use cases for the client application.
//!
//! - **`chat`** – Pumps operator input into the session and hands every
//!   received message to the display.  Input and display are reached through
//!   the [`chat::InputSource`] and [`chat::MessageDisplay`] traits, injected
//!   at construction time so tests can script both ends.

pub mod chat;
