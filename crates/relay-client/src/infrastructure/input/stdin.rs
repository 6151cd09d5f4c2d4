//! Line reader over stdin or any other buffered async reader.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::application::chat::InputSource;

/// Splits a byte stream into lines terminated by `\n` (or `\r\n`).
///
/// Lines are raw bytes: input that is not valid UTF-8 is passed through
/// unchanged rather than rejected.  A final line without a terminator is
/// still returned.
pub struct LineReader<R> {
    reader: R,
}

impl LineReader<BufReader<Stdin>> {
    /// Reads the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> InputSource for LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
