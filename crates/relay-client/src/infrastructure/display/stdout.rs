//! Prints each received message body on its own line.

use std::io::{self, Write};

use relay_core::Message;

use crate::application::chat::MessageDisplay;

/// Writes message bodies to the process's standard output.
///
/// Bodies are written as raw bytes followed by `\n` and flushed at once, so a
/// message is visible even while the operator is mid-line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutDisplay;

impl MessageDisplay for StdoutDisplay {
    fn show(&self, message: &Message) -> io::Result<()> {
        write_message(&mut io::stdout().lock(), message)
    }
}

/// Writes `message`'s body and a newline to `out`, then flushes.
pub fn write_message<W: Write>(out: &mut W, message: &Message) -> io::Result<()> {
    out.write_all(message.body())?;
    out.write_all(b"\n")?;
    out.flush()
}
