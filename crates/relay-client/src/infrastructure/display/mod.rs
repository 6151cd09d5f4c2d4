//! [`MessageDisplay`](crate::application::chat::MessageDisplay) implementations.

pub mod mock;
pub mod stdout;
