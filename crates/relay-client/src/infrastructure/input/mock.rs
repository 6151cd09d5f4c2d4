//! Scripted input source for unit testing.
//!
//! Replays a fixed list of lines, then ends in one of three ways chosen at
//! construction: end of input, an I/O error, or never returning (to model an
//! operator who simply stops typing).
//!
//! # Usage in tests
//!
//! ```ignore
//! let input = ScriptedInput::new(["hello", "bye"]);
//! let sent = pump_input(input, handle).await?;
//! assert_eq!(sent, 2);
//! ```

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;

use crate::application::chat::InputSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptEnd {
    Eof,
    Fail,
    Hang,
}

/// An input source that yields pre-recorded lines.
pub struct ScriptedInput {
    lines: VecDeque<Vec<u8>>,
    end: ScriptEnd,
}

impl ScriptedInput {
    /// Yields `lines`, then reports end of input.
    pub fn new<L: Into<Vec<u8>>>(lines: impl IntoIterator<Item = L>) -> Self {
        Self::with_end(lines, ScriptEnd::Eof)
    }

    /// Yields `lines`, then fails with [`io::ErrorKind::BrokenPipe`].
    pub fn failing<L: Into<Vec<u8>>>(lines: impl IntoIterator<Item = L>) -> Self {
        Self::with_end(lines, ScriptEnd::Fail)
    }

    /// Yields `lines`, then never returns again.
    pub fn hanging<L: Into<Vec<u8>>>(lines: impl IntoIterator<Item = L>) -> Self {
        Self::with_end(lines, ScriptEnd::Hang)
    }

    fn with_end<L: Into<Vec<u8>>>(lines: impl IntoIterator<Item = L>, end: ScriptEnd) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            end,
        }
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.lines.pop_front() {
            return Ok(Some(line));
        }
        match self.end {
            ScriptEnd::Eof => Ok(None),
            ScriptEnd::Fail => Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure")),
            ScriptEnd::Hang => std::future::pending().await,
        }
    }
}
