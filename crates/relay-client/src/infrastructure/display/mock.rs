//! Recording display for unit testing.
//!
//! Each shown message is pushed into a `Mutex<Vec<...>>` so that assertions
//! can inspect exactly what was displayed and in what order.
//!
//! # `should_fail` flag
//!
//! Construct with [`RecordingDisplay::failing`] to make every `show` call
//! return an error, for testing that display failures are not fatal.

use std::io;
use std::sync::Mutex;

use relay_core::Message;

use crate::application::chat::MessageDisplay;

/// A display that records messages instead of printing them.
#[derive(Default)]
pub struct RecordingDisplay {
    /// Every message passed to `show`, in call order.
    pub shown: Mutex<Vec<Message>>,
    /// When `true`, `show` records nothing and returns an error.
    pub should_fail: bool,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Bodies of every recorded message, decoded lossily.
    pub fn texts(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|m| m.as_text().into_owned())
            .collect()
    }
}

impl MessageDisplay for RecordingDisplay {
    fn show(&self, message: &Message) -> io::Result<()> {
        if self.should_fail {
            return Err(io::Error::new(io::ErrorKind::Other, "mock failure"));
        }
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}
