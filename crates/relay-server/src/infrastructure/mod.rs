//! Infrastructure layer for the relay server.
//!
//! Contains OS-facing adapters: the TCP accept loop and file-system config
//! storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
