//! Network infrastructure for the relay server.
//!
//! # Sub-modules
//!
//! - **`listener`** – Binds one TCP port, accepts connections, and runs each
//!   one as a session bound to that port's broadcast registry.

pub mod listener;
