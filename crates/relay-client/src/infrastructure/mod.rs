//! Infrastructure layer for the client application.
//!
//! Contains OS-facing adapters: name resolution and TCP connect, stdin
//! reading, and stdout printing.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – Resolves the relay's host name and connects to the first
//!   address that accepts.
//!
//! - **`input`** – `InputSource` implementations: line reader over stdin (or
//!   any buffered reader) plus a scripted mock for tests.
//!
//! - **`display`** – `MessageDisplay` implementations: stdout plus a
//!   recording mock for tests.

pub mod display;
pub mod input;
pub mod network;
