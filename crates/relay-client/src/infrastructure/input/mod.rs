//! [`InputSource`](crate::application::chat::InputSource) implementations.

pub mod mock;
pub mod stdin;
